//! Time-domain building blocks for acoustic echo cancellation: a delay line,
//! a cross-correlation delay tracker, a leaky-NLMS adaptive filter, a
//! double-talk detector, and a residual suppressor.
//!
//! These types are deliberately free of any notion of "sessions", control
//! channels, or configuration structs — that orchestration lives in the
//! `aec` crate. Each type here owns its buffers, never allocates past
//! construction, and is safe to drive from a real-time audio callback.

pub mod common;
mod delay_estimator;
mod delay_line;
mod double_talk_detector;
mod nlms_filter;
mod residual_suppressor;

pub use delay_estimator::DelayEstimator;
pub use delay_line::{DelayLine, DelayLineError};
pub use double_talk_detector::{DoubleTalkDetector, DtdParams, DtdState};
pub use nlms_filter::{NlmsFilter, NlmsParams};
pub use residual_suppressor::ResidualSuppressor;
