//! Real-time acoustic echo cancellation.
//!
//! Orchestrates a leaky-NLMS adaptive filter, a windowed double-talk
//! detector, a cross-correlation delay tracker, and a residual suppressor
//! (all from `aec-core`) into a single `process_block` call suitable for
//! a real-time audio callback. [`BlockProcessor`] additionally wraps the
//! control/metrics message ports expected by a capture collaborator.
//!
//! # Example
//!
//! ```
//! use aec::{Config, EchoCanceller};
//!
//! let mut aec = EchoCanceller::new(Config::default()).unwrap();
//! let mic = vec![0.0f32; 128];
//! let reference = vec![0.0f32; 128];
//! let mut clean = vec![0.0f32; 128];
//! let metrics = aec.process_block(&mic, &reference, &mut clean).unwrap();
//! assert_eq!(metrics.estimated_delay, 0);
//! ```

mod block_processor;
pub mod config;
mod echo_canceller;
mod error;
pub mod messages;
pub mod metrics;

pub use block_processor::{BlockProcessor, BlockProcessorHandle};
pub use config::{Config, ConfigDelta};
pub use echo_canceller::{BlockError, EchoCanceller};
pub use error::AecError;
pub use metrics::{AggregateMetrics, Metrics};

// Expose aec-core's types for callers who want to assemble a custom
// pipeline instead of going through EchoCanceller.
#[doc(hidden)]
pub mod internals {
    pub use aec_core::{
        DelayEstimator, DelayLine, DelayLineError, DoubleTalkDetector, DtdParams, DtdState,
        NlmsFilter, NlmsParams, ResidualSuppressor,
    };
}
