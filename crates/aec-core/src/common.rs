//! Shared constants for the time-domain echo canceller.

/// Default operating sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 48_000;

/// Default samples per processing block.
pub const DEFAULT_BLOCK_SIZE: usize = 128;

/// Default NLMS tap count (≈ 10.7 ms at 48 kHz).
pub const DEFAULT_FILTER_LENGTH: usize = 512;

/// Default leaky-NLMS leakage factor λ.
pub const DEFAULT_LEAKAGE: f32 = 0.999_99;

/// Default NLMS step size μ.
pub const DEFAULT_STEP_SIZE: f32 = 0.1;

/// Default NLMS regularization δ.
pub const DEFAULT_REGULARIZATION: f32 = 1e-6;

/// Power-estimate smoothing factor β used by the NLMS normalizer.
pub const NLMS_POWER_SMOOTHING: f32 = 0.05;

/// Instantaneous far-end power below which adaptation is gated off, to avoid
/// `μ̃ = μ / δ` divergence when only regularization would carry the update.
pub const NLMS_NOISE_GATE: f32 = 1e-6;

/// Default DTD power-ratio threshold θ_P (≈ 3 dB).
pub const DEFAULT_POWER_RATIO_THRESHOLD: f32 = 2.0;

/// Default DTD correlation threshold θ_C.
pub const DEFAULT_CORRELATION_THRESHOLD: f32 = 0.6;

/// Default DTD hangover length, in samples (50 ms @ 48 kHz).
pub const DEFAULT_HANGOVER_SAMPLES: u32 = 2400;

/// Default DTD correlation window length, in samples.
pub const DEFAULT_WINDOW_SIZE: usize = 512;

/// Smoothing factor α used for DTD power/cross-power estimates.
pub const DTD_POWER_SMOOTHING: f32 = 0.95;

/// Default maximum delay estimate, in samples (10 ms @ 48 kHz).
pub const DEFAULT_MAX_DELAY: u32 = 480;

/// Smoothing factor α applied to the raw per-block delay estimate.
pub const DELAY_SMOOTHING: f32 = 0.1;

/// Residual suppressor attenuation `s` in `e_n *= 1 - s`.
pub const RESIDUAL_SUPPRESSION: f32 = 0.1;

/// `|ref*[n]|` threshold above which the residual suppressor attenuates.
pub const RESIDUAL_SUPPRESSOR_GATE: f32 = 1e-3;

/// Power (sum of squares) below which both signals are considered
/// near-silent and the delay estimate is held rather than updated.
pub const DELAY_SILENCE_FLOOR: f32 = 1e-12;

/// Lower bound for reported ERLE, in dB.
pub const ERLE_MIN_DB: f32 = 0.0;

/// Upper bound for reported ERLE, in dB.
pub const ERLE_MAX_DB: f32 = 60.0;

/// Floor applied to the mean-square denominator when computing ERLE, to
/// avoid a divide-by-zero on a perfectly silent output block.
pub const ERLE_POWER_FLOOR: f32 = 1e-10;

/// Default metrics push cadence, in samples (100 ms @ 48 kHz).
pub const DEFAULT_METRICS_INTERVAL: u32 = 4800;
