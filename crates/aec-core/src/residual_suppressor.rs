//! Residual echo suppressor: a small fixed-depth attenuation applied to the
//! NLMS error signal whenever the aligned reference is active, to mop up
//! echo the linear filter under-models (non-linearities, mis-tracked delay).

use crate::common::{RESIDUAL_SUPPRESSION, RESIDUAL_SUPPRESSOR_GATE};

/// Stateless per-sample gain applied to the linear filter's error signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualSuppressor {
    suppression: f32,
    gate: f32,
}

impl Default for ResidualSuppressor {
    fn default() -> Self {
        Self {
            suppression: RESIDUAL_SUPPRESSION,
            gate: RESIDUAL_SUPPRESSOR_GATE,
        }
    }
}

impl ResidualSuppressor {
    /// Creates a suppressor with a fixed fractional `suppression` (0.0..1.0)
    /// applied whenever `|ref| > gate`.
    pub fn new(suppression: f32, gate: f32) -> Self {
        Self { suppression, gate }
    }

    /// Applies the suppression gain to `error` in place given the aligned
    /// reference sample `ref_aligned` for the same sample index.
    pub fn apply(&self, error: &mut [f32], ref_aligned: &[f32]) {
        debug_assert_eq!(error.len(), ref_aligned.len());
        for (e, &r) in error.iter_mut().zip(ref_aligned.iter()) {
            if r.abs() > self.gate {
                *e *= 1.0 - self.suppression;
            }
        }
    }
}
