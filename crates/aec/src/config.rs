//! Echo canceller configuration.
//!
//! [`Config`] is fixed at construction — it determines buffer sizes, so
//! changing it mid-session would require reallocating on the real-time
//! path. Live-tunable fields are broken out into [`ConfigDelta`], applied
//! through [`crate::EchoCanceller::set_config`] at a block boundary.

use crate::error::AecError;

/// Construction-time configuration for an [`crate::EchoCanceller`].
///
/// All fields are fixed for the lifetime of the canceller; to change one
/// (e.g. `filter_length`), construct a new instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Operating sample rate in Hz. Affects every time-defined constant
    /// below (default: 48000).
    pub sample_rate_hz: u32,
    /// Samples per processing block (default: 128).
    pub block_size: usize,
    /// NLMS tap count; affects tail length and CPU cost (default: 512).
    pub filter_length: usize,
    /// Initial adaptive step size μ (default: 0.1).
    pub step_size: f32,
    /// Regularization floor δ (default: 1e-6).
    pub regularization: f32,
    /// Leakage factor λ applied to taps per update (default: 0.99999).
    pub leakage: f32,
    /// Double-talk power-ratio trigger θ_P (default: 2.0).
    pub power_ratio_threshold: f32,
    /// Double-talk correlation trigger θ_C (default: 0.6).
    pub correlation_threshold: f32,
    /// Double-talk hangover length, in samples (default: 2400).
    pub hangover_samples: u32,
    /// Double-talk correlation window, in samples (default: 512).
    pub window_size: usize,
    /// Upper bound on the tracked delay, in samples (default: 480).
    pub max_delay: u32,
    /// Metrics push cadence, in samples (default: 4800, i.e. 100 ms @ 48 kHz).
    pub metrics_interval: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate_hz: aec_core::common::DEFAULT_SAMPLE_RATE_HZ,
            block_size: aec_core::common::DEFAULT_BLOCK_SIZE,
            filter_length: aec_core::common::DEFAULT_FILTER_LENGTH,
            step_size: aec_core::common::DEFAULT_STEP_SIZE,
            regularization: aec_core::common::DEFAULT_REGULARIZATION,
            leakage: aec_core::common::DEFAULT_LEAKAGE,
            power_ratio_threshold: aec_core::common::DEFAULT_POWER_RATIO_THRESHOLD,
            correlation_threshold: aec_core::common::DEFAULT_CORRELATION_THRESHOLD,
            hangover_samples: aec_core::common::DEFAULT_HANGOVER_SAMPLES,
            window_size: aec_core::common::DEFAULT_WINDOW_SIZE,
            max_delay: aec_core::common::DEFAULT_MAX_DELAY,
            metrics_interval: aec_core::common::DEFAULT_METRICS_INTERVAL,
        }
    }
}

impl Config {
    /// Validates the configuration, returning the first violated constraint.
    pub(crate) fn validate(&self) -> Result<(), AecError> {
        if self.block_size == 0 {
            return Err(AecError::Configuration("block_size must be non-zero"));
        }
        if self.filter_length == 0 {
            return Err(AecError::Configuration("filter_length must be non-zero"));
        }
        if self.sample_rate_hz == 0 {
            return Err(AecError::Configuration("sample_rate_hz must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.leakage) {
            return Err(AecError::Configuration("leakage must be in [0, 1]"));
        }
        if self.step_size <= 0.0 {
            return Err(AecError::Configuration("step_size must be positive"));
        }
        Ok(())
    }
}

/// Live-updatable parameters, applied at the next block boundary via
/// [`crate::EchoCanceller::set_config`]. `None` leaves the current value
/// unchanged. Filter length and other construction-time fields are
/// intentionally absent: they cannot be changed without reallocation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfigDelta {
    /// New adaptive step size μ.
    pub step_size: Option<f32>,
    /// New regularization floor δ.
    pub regularization: Option<f32>,
    /// New leakage factor λ.
    pub leakage: Option<f32>,
    /// New double-talk power-ratio trigger θ_P.
    pub power_ratio_threshold: Option<f32>,
    /// New double-talk correlation trigger θ_C.
    pub correlation_threshold: Option<f32>,
    /// New double-talk hangover length, in samples.
    pub hangover_samples: Option<u32>,
}
