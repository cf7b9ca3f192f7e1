//! Double-talk detector: gates NLMS adaptation using a power-ratio test, a
//! windowed cross-correlation test, and a hangover state machine.

use crate::common::DTD_POWER_SMOOTHING;

/// Live-tunable DTD thresholds (the hangover length and window size are
/// fixed at construction — see spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DtdParams {
    /// Power-ratio trigger θ_P.
    pub power_ratio_threshold: f32,
    /// Correlation trigger θ_C.
    pub correlation_threshold: f32,
    /// Hangover length, in samples.
    pub hangover_samples: u32,
}

/// Double-talk detector states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtdState {
    /// No far-end activity observed recently.
    Idle,
    /// Far-end active, no near-end speech detected; adaptation enabled.
    SingleTalk,
    /// Both far-end and near-end simultaneously active; adaptation frozen.
    DoubleTalk,
    /// Just exited double-talk; adaptation remains frozen until the
    /// hangover counter elapses.
    Hold,
}

/// Gates [`crate::nlms_filter::NlmsFilter`] adaptation from block-level
/// power, cross-power, and windowed correlation statistics.
#[derive(Debug, Clone)]
pub struct DoubleTalkDetector {
    params: DtdParams,
    state: DtdState,
    hangover_remaining: u32,
    power_near: f32,
    power_far: f32,
    power_cross: f32,
    mic_window: Vec<f32>,
    ref_window: Vec<f32>,
    window_pos: usize,
    window_filled: bool,
}

impl DoubleTalkDetector {
    /// Creates a detector with a correlation window of `window_size` samples.
    pub fn new(window_size: usize, params: DtdParams) -> Self {
        Self {
            params,
            state: DtdState::Idle,
            hangover_remaining: 0,
            power_near: 0.0,
            power_far: 0.0,
            power_cross: 0.0,
            mic_window: vec![0.0; window_size.max(1)],
            ref_window: vec![0.0; window_size.max(1)],
            window_pos: 0,
            window_filled: false,
        }
    }

    /// The current state.
    #[inline]
    pub fn state(&self) -> DtdState {
        self.state
    }

    /// Whether NLMS adaptation should be enabled for the block just processed.
    #[inline]
    pub fn should_adapt(&self) -> bool {
        !matches!(self.state, DtdState::DoubleTalk | DtdState::Hold)
    }

    /// Updates the live-tunable thresholds.
    pub fn set_params(&mut self, params: DtdParams) {
        self.params = params;
    }

    /// Resets to the initial `Idle` state with zeroed statistics.
    pub fn reset(&mut self) {
        self.state = DtdState::Idle;
        self.hangover_remaining = 0;
        self.power_near = 0.0;
        self.power_far = 0.0;
        self.power_cross = 0.0;
        self.mic_window.fill(0.0);
        self.ref_window.fill(0.0);
        self.window_pos = 0;
        self.window_filled = false;
    }

    /// Processes one block of `mic`/`ref` (aligned reference) samples,
    /// updates the smoothed power statistics and the windowed correlation
    /// buffer, evaluates the decision `dt`, advances the state machine, and
    /// returns [`Self::should_adapt`] for the block just evaluated.
    pub fn process(&mut self, mic: &[f32], ref_aligned: &[f32]) -> bool {
        debug_assert_eq!(mic.len(), ref_aligned.len());
        let alpha = DTD_POWER_SMOOTHING;

        for (&m, &r) in mic.iter().zip(ref_aligned.iter()) {
            self.power_near = alpha * self.power_near + (1.0 - alpha) * (m * m);
            self.power_far = alpha * self.power_far + (1.0 - alpha) * (r * r);
            self.power_cross = alpha * self.power_cross + (1.0 - alpha) * (m * r);

            let window_len = self.mic_window.len();
            self.mic_window[self.window_pos] = m;
            self.ref_window[self.window_pos] = r;
            self.window_pos = (self.window_pos + 1) % window_len;
            if self.window_pos == 0 {
                self.window_filled = true;
            }
        }

        let dt = self.decide();
        self.transition(dt, mic.len() as u32);
        self.should_adapt()
    }

    fn decide(&self) -> bool {
        const EPS: f32 = 1e-10;
        let power_test = self.power_near / (self.power_far + EPS) > self.params.power_ratio_threshold;
        let correlation_test = self.correlation().abs() < self.params.correlation_threshold;
        power_test || correlation_test
    }

    /// Pearson correlation coefficient over the windowed history. Returns
    /// `1.0` (no trigger) until the window has filled at least once, since
    /// a partially-filled window padded with zeros would bias the estimate
    /// toward the uncorrelated case.
    fn correlation(&self) -> f32 {
        if !self.window_filled {
            return 1.0;
        }
        let n = self.mic_window.len() as f32;
        let mean_m: f32 = self.mic_window.iter().sum::<f32>() / n;
        let mean_r: f32 = self.ref_window.iter().sum::<f32>() / n;

        let mut cov = 0.0f32;
        let mut var_m = 0.0f32;
        let mut var_r = 0.0f32;
        for (&m, &r) in self.mic_window.iter().zip(self.ref_window.iter()) {
            let dm = m - mean_m;
            let dr = r - mean_r;
            cov += dm * dr;
            var_m += dm * dm;
            var_r += dr * dr;
        }
        let denom = (var_m * var_r).sqrt();
        if denom < 1e-12 {
            0.0
        } else {
            cov / denom
        }
    }

    fn transition(&mut self, dt: bool, block_size: u32) {
        let far_active = self.power_far > 1e-6;
        let far_idle = self.power_far < 1e-7;
        let far_low = self.power_far <= 1e-7;

        let from = self.state;
        self.state = match self.state {
            DtdState::Idle => {
                if far_active && dt {
                    self.hangover_remaining = self.params.hangover_samples;
                    DtdState::DoubleTalk
                } else if far_active {
                    DtdState::SingleTalk
                } else {
                    DtdState::Idle
                }
            }
            DtdState::SingleTalk => {
                if dt {
                    self.hangover_remaining = self.params.hangover_samples;
                    DtdState::DoubleTalk
                } else if far_idle {
                    DtdState::Idle
                } else {
                    DtdState::SingleTalk
                }
            }
            DtdState::DoubleTalk => {
                if !dt {
                    self.hangover_remaining = self.params.hangover_samples;
                    DtdState::Hold
                } else {
                    DtdState::DoubleTalk
                }
            }
            DtdState::Hold => {
                if dt {
                    self.hangover_remaining = self.params.hangover_samples;
                    DtdState::DoubleTalk
                } else if self.hangover_remaining == 0 && !far_low {
                    DtdState::SingleTalk
                } else if self.hangover_remaining == 0 {
                    DtdState::Idle
                } else {
                    self.hangover_remaining = self.hangover_remaining.saturating_sub(block_size);
                    DtdState::Hold
                }
            }
        };

        if self.state != from {
            tracing::trace!(?from, to = ?self.state, "double-talk detector state transition");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DtdParams {
        DtdParams {
            power_ratio_threshold: 2.0,
            correlation_threshold: 0.6,
            hangover_samples: 2400,
        }
    }

    #[test]
    fn starts_idle() {
        let dtd = DoubleTalkDetector::new(512, params());
        assert_eq!(dtd.state(), DtdState::Idle);
        assert!(dtd.should_adapt());
    }

    #[test]
    fn single_talk_on_correlated_reference_only() {
        let mut dtd = DoubleTalkDetector::new(64, params());
        let ref_block: Vec<f32> = (0..128).map(|i| (i as f32 * 0.1).sin() * 0.5).collect();
        for chunk in ref_block.chunks(64) {
            dtd.process(chunk, chunk);
        }
        assert_eq!(dtd.state(), DtdState::SingleTalk);
        assert!(dtd.should_adapt());
    }

    #[test]
    fn double_talk_freezes_adaptation_then_hangover_then_recovers() {
        let mut dtd = DoubleTalkDetector::new(64, params());
        let ref_block: Vec<f32> = (0..128).map(|i| (i as f32 * 0.1).sin() * 0.5).collect();
        for chunk in ref_block.chunks(64) {
            dtd.process(chunk, chunk);
        }
        assert_eq!(dtd.state(), DtdState::SingleTalk);

        // Loud, uncorrelated near-end burst while reference stays active.
        let near: Vec<f32> = (0..64).map(|i| (i as f32 * 1.7).sin() * 0.9).collect();
        let refb = &ref_block[..64];
        let adapt = dtd.process(&near, refb);
        assert_eq!(dtd.state(), DtdState::DoubleTalk);
        assert!(!adapt);

        // Near-end stops; should move to Hold and stay there through the
        // hangover, then recover to SingleTalk since the reference is still
        // active.
        let quiet = vec![0.0f32; 64];
        let mut blocks = 0;
        loop {
            dtd.process(&quiet, refb);
            blocks += 1;
            if dtd.state() != DtdState::Hold || blocks > 1000 {
                break;
            }
        }
        assert_eq!(dtd.state(), DtdState::SingleTalk);
    }

    #[test]
    fn returns_to_idle_when_reference_goes_silent_in_hold() {
        let p = DtdParams {
            hangover_samples: 64,
            ..params()
        };
        let mut dtd = DoubleTalkDetector::new(32, p);
        let ref_block: Vec<f32> = (0..64).map(|i| (i as f32 * 0.2).sin() * 0.5).collect();
        dtd.process(&ref_block, &ref_block);
        assert_eq!(dtd.state(), DtdState::SingleTalk);

        let near: Vec<f32> = (0..32).map(|i| (i as f32 * 1.9).cos() * 0.9).collect();
        dtd.process(&near, &ref_block[..32]);
        assert_eq!(dtd.state(), DtdState::DoubleTalk);

        let silence = vec![0.0f32; 32];
        loop {
            dtd.process(&silence, &silence);
            if dtd.state() != DtdState::Hold {
                break;
            }
        }
        assert_eq!(dtd.state(), DtdState::Idle);
    }

    #[test]
    fn reset_restores_idle() {
        let mut dtd = DoubleTalkDetector::new(32, params());
        let ref_block: Vec<f32> = (0..32).map(|i| (i as f32 * 0.3).sin()).collect();
        dtd.process(&ref_block, &ref_block);
        assert_ne!(dtd.state(), DtdState::Idle);
        dtd.reset();
        assert_eq!(dtd.state(), DtdState::Idle);
    }
}
