//! Per-block and aggregated metrics pushed from the real-time path.

use aec_core::DtdState;

/// Snapshot of the canceller's state after processing one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    /// Echo Return Loss Enhancement for this block, in dB, clamped to `[0, 60]`.
    pub erle_db: f32,
    /// Whether NLMS adaptation ran on this block.
    pub adaptation_enabled: bool,
    /// Current delay estimate, in samples.
    pub estimated_delay: u32,
    /// RMS of the input (microphone) block.
    pub input_rms: f32,
    /// RMS of the output (clean) block.
    pub output_rms: f32,
    /// Wall-clock time spent inside `process_block`, in microseconds.
    pub processing_latency_us: u64,
    /// Current double-talk detector state.
    pub dt_state: DtdState,
    /// Count of non-finite input samples zeroed so far this session.
    pub non_finite_warnings: u64,
    /// Count of delay-line reads clamped to the ring's capacity so far
    /// this session (would otherwise be an out-of-range read).
    pub clamped_reads: u64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            erle_db: 0.0,
            adaptation_enabled: false,
            estimated_delay: 0,
            input_rms: 0.0,
            output_rms: 0.0,
            processing_latency_us: 0,
            dt_state: DtdState::Idle,
            non_finite_warnings: 0,
            clamped_reads: 0,
        }
    }
}

/// Aggregated counters exposed through the control channel's `GetMetrics`
/// response, distinct from the per-block [`Metrics`] pushed at cadence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AggregateMetrics {
    /// Total samples processed this session.
    pub processed_samples: u64,
    /// Running mean of `erle_db` across all processed blocks.
    pub average_erle_db: f32,
    /// Whether the processor is currently in the `Running` state.
    pub is_processing: bool,
    /// Most recent delay estimate, in samples.
    pub estimated_delay: u32,
    /// Most recent processing latency, in microseconds.
    pub processing_latency_us: u64,
    /// Most recent double-talk detector state.
    pub dt_state: DtdState,
}
