//! Orchestrates the delay line, delay estimator, NLMS filter, double-talk
//! detector, and residual suppressor into a single `process_block` call.

use aec_core::{
    DelayEstimator, DelayLine, DoubleTalkDetector, DtdParams, NlmsFilter, NlmsParams,
    ResidualSuppressor,
};

use crate::config::{Config, ConfigDelta};
use crate::error::AecError;
use crate::metrics::Metrics;

/// A session-scoped, value-typed echo canceller.
///
/// Owns exactly one of each DSP component (per spec: "no shared mutable
/// state between sessions"). Construct one per capture session; tearing it
/// down simply drops it.
#[derive(Debug)]
pub struct EchoCanceller {
    config: Config,
    ref_line: DelayLine,
    delay_estimator: DelayEstimator,
    nlms: NlmsFilter,
    dtd: DoubleTalkDetector,
    suppressor: ResidualSuppressor,

    aligned_ref: Vec<f32>,
    error_buf: Vec<f32>,
    sanitized_mic: Vec<f32>,
    sanitized_ref: Vec<f32>,
    non_finite_mask: Vec<bool>,

    non_finite_warnings: u64,
    last_non_finite_warning_sample: Option<u64>,
    samples_processed: u64,
}

/// Error raised on a per-block basis. Unlike [`AecError`], these never
/// abort the session — the block path always returns a full-length,
/// sample-accurate (possibly silent) output alongside the error.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum BlockError {
    /// `mic.len() != ref.len()` or either disagreed with the configured
    /// block size.
    #[error("block size mismatch: mic={mic_len}, ref={ref_len}, expected={expected}")]
    BlockSizeMismatch {
        /// Length of the microphone block supplied.
        mic_len: usize,
        /// Length of the reference block supplied.
        ref_len: usize,
        /// The block size the canceller was constructed with.
        expected: usize,
    },
}

impl EchoCanceller {
    /// Constructs a canceller, preallocating every buffer it will ever use.
    ///
    /// # Errors
    ///
    /// Returns [`AecError::Configuration`] if `config` fails validation.
    pub fn new(config: Config) -> Result<Self, AecError> {
        config.validate()?;

        let ref_capacity = config.filter_length + config.max_delay as usize + config.block_size;
        let ref_line = DelayLine::new(ref_capacity)
            .map_err(|_| AecError::Configuration("filter_length/max_delay/block_size overflow"))?;

        let nlms = NlmsFilter::new(
            config.filter_length,
            NlmsParams {
                step_size: config.step_size,
                leakage: config.leakage,
                regularization: config.regularization,
            },
        );

        let dtd = DoubleTalkDetector::new(
            config.window_size,
            DtdParams {
                power_ratio_threshold: config.power_ratio_threshold,
                correlation_threshold: config.correlation_threshold,
                hangover_samples: config.hangover_samples,
            },
        );

        Ok(Self {
            config,
            ref_line,
            delay_estimator: DelayEstimator::new(config.max_delay),
            nlms,
            dtd,
            suppressor: ResidualSuppressor::default(),
            aligned_ref: vec![0.0; config.block_size],
            error_buf: vec![0.0; config.block_size],
            sanitized_mic: vec![0.0; config.block_size],
            sanitized_ref: vec![0.0; config.block_size],
            non_finite_mask: vec![false; config.block_size],
            non_finite_warnings: 0,
            last_non_finite_warning_sample: None,
            samples_processed: 0,
        })
    }

    /// The configuration this canceller was constructed with.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Processes one block of `mic`/`ref` samples, returning the cleaned
    /// block and a metrics snapshot.
    ///
    /// Non-finite samples in either input are replaced with zero before
    /// processing; `metrics.non_finite_warnings` is incremented (rate
    /// limited to once per second of audio) whenever this happens, and
    /// adaptation is forced off for the affected block.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::BlockSizeMismatch`] without mutating any
    /// internal state if `mic`/`ref` don't match the configured block size.
    pub fn process_block(
        &mut self,
        mic: &[f32],
        ref_signal: &[f32],
        clean_out: &mut [f32],
    ) -> Result<Metrics, BlockError> {
        let started_at = std::time::Instant::now();
        let n = self.config.block_size;
        if mic.len() != ref_signal.len() || mic.len() != n || clean_out.len() != n {
            return Err(BlockError::BlockSizeMismatch {
                mic_len: mic.len(),
                ref_len: ref_signal.len(),
                expected: n,
            });
        }

        self.non_finite_mask.fill(false);
        let mic_had_non_finite = self.sanitize_into(mic, true);
        let ref_had_non_finite = self.sanitize_into(ref_signal, false);
        let had_non_finite = mic_had_non_finite || ref_had_non_finite;

        let mic = &self.sanitized_mic[..];
        let ref_signal = &self.sanitized_ref[..];

        self.ref_line.write_block(ref_signal);
        let delay = self.delay_estimator.update(mic, &self.ref_line);

        // ref_capacity = filter_length + max_delay + block_size and the
        // estimator never returns more than max_delay, so this read always
        // fits within the ring.
        self.ref_line
            .read_block(&mut self.aligned_ref, delay)
            .expect("delay estimate is bounded by max_delay, which sizes ref_line");
        // read_block fills aligned_ref newest-first (dst[0] = most recent),
        // but mic/clean_out are in chronological order, oldest-first. Flip
        // it so aligned_ref[n] lines up with mic[n] before handing it to the
        // DTD's index-for-index zip and the suppressor's per-sample gate.
        self.aligned_ref.reverse();

        let dtd_wants_adapt = self.dtd.process(mic, &self.aligned_ref);
        let adapt = dtd_wants_adapt && !had_non_finite;

        self.nlms
            .process_block(mic, &self.ref_line, delay, adapt, &mut self.error_buf);

        clean_out.copy_from_slice(&self.error_buf);
        self.suppressor.apply(clean_out, &self.aligned_ref);

        if had_non_finite {
            for (out, &non_finite) in clean_out.iter_mut().zip(self.non_finite_mask.iter()) {
                if non_finite {
                    *out = 0.0;
                }
            }
        }

        let input_power = mean_square(mic);
        let output_power = mean_square(clean_out);
        let erle_db = (10.0 * (input_power / output_power.max(aec_core::common::ERLE_POWER_FLOOR)).log10())
            .clamp(aec_core::common::ERLE_MIN_DB, aec_core::common::ERLE_MAX_DB);

        if had_non_finite {
            let should_emit = match self.last_non_finite_warning_sample {
                None => true,
                Some(last) => {
                    self.samples_processed.saturating_sub(last) >= self.config.sample_rate_hz as u64
                }
            };
            if should_emit {
                self.non_finite_warnings += 1;
                self.last_non_finite_warning_sample = Some(self.samples_processed);
                tracing::warn!(
                    samples_processed = self.samples_processed,
                    "non-finite sample encountered; zeroed and disabled adaptation for this block"
                );
            }
        }
        self.samples_processed += n as u64;

        Ok(Metrics {
            erle_db,
            adaptation_enabled: adapt,
            estimated_delay: delay,
            input_rms: input_power.sqrt(),
            output_rms: output_power.sqrt(),
            processing_latency_us: started_at.elapsed().as_micros() as u64,
            dt_state: self.dtd.state(),
            non_finite_warnings: self.non_finite_warnings,
            clamped_reads: self.ref_line.clamped_reads(),
        })
    }

    /// Copies `src` into the internal sanitized buffer (mic if
    /// `is_mic`, else reference), zeroing non-finite samples and marking
    /// their indices in `non_finite_mask` so the caller can also zero the
    /// corresponding output samples (spec.md §4.3/§7: a non-finite input
    /// sample must not leave a nonzero residual in `clean_out`, since
    /// `error = mic - y_hat` is generally nonzero even with `mic` zeroed
    /// once the filter has converged). Returns whether any sample was
    /// non-finite.
    fn sanitize_into(&mut self, src: &[f32], is_mic: bool) -> bool {
        let dst = if is_mic {
            &mut self.sanitized_mic
        } else {
            &mut self.sanitized_ref
        };
        let mut had_non_finite = false;
        for ((d, &s), m) in dst.iter_mut().zip(src.iter()).zip(self.non_finite_mask.iter_mut()) {
            if s.is_finite() {
                *d = s;
            } else {
                *d = 0.0;
                *m = true;
                had_non_finite = true;
            }
        }
        had_non_finite
    }

    /// Clears all component state (delay line, filter taps, DTD, delay
    /// estimate) and reseeds the delay estimate to zero. Configuration and
    /// preallocated buffers are unaffected.
    pub fn reset(&mut self) {
        self.ref_line.clear();
        self.nlms.reset();
        self.dtd.reset();
        self.delay_estimator.reset();
        self.non_finite_warnings = 0;
        self.last_non_finite_warning_sample = None;
        self.samples_processed = 0;
    }

    /// Live-updates step size, leakage, regularization, and double-talk
    /// thresholds. Filter length and other construction-time fields are
    /// unaffected — `delta` fields left `None` keep their current value.
    pub fn set_config(&mut self, delta: ConfigDelta) {
        if let Some(step_size) = delta.step_size {
            self.config.step_size = step_size;
        }
        if let Some(leakage) = delta.leakage {
            self.config.leakage = leakage;
        }
        if let Some(regularization) = delta.regularization {
            self.config.regularization = regularization;
        }
        self.nlms.set_params(NlmsParams {
            step_size: self.config.step_size,
            leakage: self.config.leakage,
            regularization: self.config.regularization,
        });

        if let Some(power_ratio_threshold) = delta.power_ratio_threshold {
            self.config.power_ratio_threshold = power_ratio_threshold;
        }
        if let Some(correlation_threshold) = delta.correlation_threshold {
            self.config.correlation_threshold = correlation_threshold;
        }
        if let Some(hangover_samples) = delta.hangover_samples {
            self.config.hangover_samples = hangover_samples;
        }
        self.dtd.set_params(DtdParams {
            power_ratio_threshold: self.config.power_ratio_threshold,
            correlation_threshold: self.config.correlation_threshold,
            hangover_samples: self.config.hangover_samples,
        });
    }

    /// Total samples processed since construction or the last [`Self::reset`].
    #[inline]
    pub fn samples_processed(&self) -> u64 {
        self.samples_processed
    }

    /// The NLMS filter's current tap vector. Exposed for diagnostics and
    /// integration tests that verify convergence against a known impulse
    /// response; not part of the real-time block-processing contract.
    #[inline]
    pub fn nlms_taps(&self) -> &[f32] {
        self.nlms.taps()
    }
}

fn mean_square(block: &[f32]) -> f32 {
    if block.is_empty() {
        return 0.0;
    }
    block.iter().map(|&s| s * s).sum::<f32>() / block.len() as f32
}
