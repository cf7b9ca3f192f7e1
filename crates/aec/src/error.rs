//! Error taxonomy for the echo canceller's construction and control paths.

/// Errors surfaced synchronously to the caller.
///
/// Errors on the real-time block path (`BlockSizeMismatch`, `NonFiniteInput`,
/// `OutOfRange`) are never raised this way — per the block-path contract
/// they degrade to zeroed output plus a metrics warning instead. Only
/// construction-time and control-path failures reach here.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum AecError {
    /// Invalid construction parameters.
    #[error("invalid configuration: {0}")]
    Configuration(&'static str),
    /// The capture source's sample rate no longer matches the rate the
    /// canceller was constructed with. Fatal; requires re-initialization.
    #[error("sample rate mismatch: expected {expected} Hz, got {actual} Hz")]
    RateMismatch {
        /// The rate the canceller was constructed with.
        expected: u32,
        /// The rate reported by the capture source.
        actual: u32,
    },
}
