//! Adaptive FIR identifier of the loudspeaker-to-microphone echo path,
//! updated sample-by-sample with leaky Normalized Least-Mean-Squares.

use crate::common::{NLMS_NOISE_GATE, NLMS_POWER_SMOOTHING};
use crate::delay_line::DelayLine;

/// Tunable NLMS parameters. Step size, leakage, and regularization are all
/// live-updatable mid-session (spec: filter length is fixed post-construction).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NlmsParams {
    /// Step size μ.
    pub step_size: f32,
    /// Leakage factor λ, applied as a per-update multiplicative tap decay.
    pub leakage: f32,
    /// Regularization δ, the denominator floor.
    pub regularization: f32,
}

/// Adaptive FIR filter identifying the echo path. Does not own a reference
/// buffer: it reads the aligned reference directly out of the caller's
/// [`DelayLine`] on each sample, avoiding a per-sample allocation.
#[derive(Debug, Clone)]
pub struct NlmsFilter {
    taps: Vec<f32>,
    power: f32,
    params: NlmsParams,
}

impl NlmsFilter {
    /// Creates a filter with `length` taps, all initially zero.
    pub fn new(length: usize, params: NlmsParams) -> Self {
        Self {
            taps: vec![0.0; length],
            power: 1e-6,
            params,
        }
    }

    /// The fixed number of taps.
    #[inline]
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Whether the filter holds zero taps (construction parameter is never
    /// actually zero in practice, but this satisfies the usual `len`/
    /// `is_empty` pairing).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Current tap vector, for diagnostics and tests.
    #[inline]
    pub fn taps(&self) -> &[f32] {
        &self.taps
    }

    /// Updates the live-tunable parameters (step size, leakage, regularization).
    pub fn set_params(&mut self, params: NlmsParams) {
        self.params = params;
    }

    /// Zeroes the tap vector and resets the power estimate.
    pub fn reset(&mut self) {
        self.taps.fill(0.0);
        self.power = 1e-6;
    }

    /// Processes one block: for each sample, predicts the echo from the
    /// aligned reference held in `ref_line` at offset `delay`, subtracts it
    /// from `mic[n]`, and — when `adapt` is true — updates the taps.
    /// Writes the error (clean) signal into `error_out`.
    ///
    /// Non-finite `mic`/`ref` samples are not produced by this filter; the
    /// caller (`EchoCanceller`) is responsible for zeroing non-finite input
    /// before it reaches here and for forcing `adapt = false` for the block,
    /// per the spec's `NonFiniteInput` handling.
    pub fn process_block(
        &mut self,
        mic: &[f32],
        ref_line: &DelayLine,
        delay: u32,
        adapt: bool,
        error_out: &mut [f32],
    ) {
        debug_assert_eq!(mic.len(), error_out.len());
        let l = self.taps.len();
        let block_len = mic.len();

        for (n, (&mic_n, error_n)) in mic.iter().zip(error_out.iter_mut()).enumerate() {
            // ref_line is written once per block, before this loop runs, so
            // offset 0 always names the block's *last* sample. Sample n's
            // own "now" is block_len - 1 - n samples further back than that;
            // every read below carries that slide so x_n[i] = ref[n - i]
            // rather than every sample in the block reading the same frozen
            // window anchored at the block's end.
            let slide = (block_len - 1 - n) as u32;

            // x_n[i] = ref_line.read(delay + slide + i), i in [0, L); reverse time order.
            let mut y_hat = 0.0f32;
            for (i, &tap) in self.taps.iter().enumerate() {
                let x_i = ref_line.read_clamped(delay + slide + i as u32);
                y_hat += tap * x_i;
            }

            let error = mic_n - y_hat;
            *error_n = error;

            // Spec §4.3 step 4 is a single "if and only if" clause: leakage
            // and the gradient term both apply only when adapting against a
            // live reference, never independently. Gating leakage on its own
            // would decay taps during a DTD freeze (testable property 4
            // requires near-zero drift there); applying it unconditionally
            // would violate that same property over a long double-talk
            // window. See DESIGN.md for the reconciliation with property 7.
            let x0 = ref_line.read_clamped(delay + slide);
            let gate_open = adapt && x0 * x0 > NLMS_NOISE_GATE;

            if gate_open {
                self.power += NLMS_POWER_SMOOTHING * (x0 * x0 - self.power);
                let ref_power = self.power * l as f32 + self.params.regularization;
                let mu_tilde = self.params.step_size / ref_power;

                for (i, tap) in self.taps.iter_mut().enumerate() {
                    let x_i = ref_line.read_clamped(delay + slide + i as u32);
                    *tap = self.params.leakage * *tap + mu_tilde * error * x_i;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_params() -> NlmsParams {
        NlmsParams {
            step_size: 0.2,
            leakage: 0.999_99,
            regularization: 1e-6,
        }
    }

    #[test]
    fn silence_in_silence_out_and_taps_unchanged() {
        let mut filter = NlmsFilter::new(64, default_params());
        let line = DelayLine::new(256).unwrap();
        let mic = vec![0.0f32; 32];
        let mut out = vec![0.0f32; 32];

        filter.process_block(&mic, &line, 0, true, &mut out);

        assert!(out.iter().all(|&s| s == 0.0));
        assert!(filter.taps().iter().all(|&w| w == 0.0));
    }

    #[test]
    fn converges_on_known_impulse_response() {
        // mic = 0.5 * ref delayed by 16 samples; no near-end signal.
        let filter_length = 64;
        let delay = 0u32; // aligned reference already compensates for the path delay.
        let mut filter = NlmsFilter::new(filter_length, NlmsParams {
            step_size: 0.5,
            leakage: 0.99999,
            regularization: 1e-6,
        });

        let mut line = DelayLine::new(4096).unwrap();
        let block_size = 128;
        let mut rng_state = 0x2545f4914f6cdd1du64;
        let mut next_sample = || {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;
            ((rng_state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
        };

        let num_blocks = 40;
        let mut history: Vec<f32> = Vec::new();
        for _ in 0..num_blocks {
            let ref_block: Vec<f32> = (0..block_size).map(|_| next_sample()).collect();
            history.extend_from_slice(&ref_block);
            line.write_block(&ref_block);

            // mic[n] = 0.5 * ref[n - 16], using the history built so far.
            let mut mic = vec![0.0f32; block_size];
            let base = history.len() - block_size;
            for n in 0..block_size {
                let idx = base + n;
                mic[n] = if idx >= 16 { 0.5 * history[idx - 16] } else { 0.0 };
            }

            let mut out = vec![0.0f32; block_size];
            filter.process_block(&mic, &line, delay, true, &mut out);
        }

        assert!(
            (filter.taps()[16] - 0.5).abs() < 0.05,
            "tap[16] = {}, expected ~0.5",
            filter.taps()[16]
        );
        for (i, &w) in filter.taps().iter().enumerate() {
            if i != 16 {
                assert!(w.abs() < 0.05, "tap[{i}] = {w} should be near zero");
            }
        }
    }

    #[test]
    fn each_sample_reads_its_own_causal_window_not_the_block_end() {
        // Regression test for a bug where every sample n in the block read
        // the same frozen reference window anchored at the block's last
        // sample, instead of sliding back by (block_len - 1 - n). A single
        // tap w[0] = 1 with adaptation off makes y_hat_n = x_n[0] exactly,
        // so with delay = 0 the error must equal mic_n minus the reference
        // sample that is chronologically aligned with mic_n.
        let mut filter = NlmsFilter::new(3, default_params());
        filter.taps[0] = 1.0;

        let mut line = DelayLine::new(64).unwrap();
        let reference = vec![10.0f32, 20.0, 30.0, 40.0];
        line.write_block(&reference);

        let mic = vec![0.0f32; 4];
        let mut out = vec![0.0f32; 4];
        filter.process_block(&mic, &line, 0, false, &mut out);

        // error_n = mic_n - reference[n], not mic_n - reference[3] (the
        // block's last/most-recent sample) for every n.
        let expected: Vec<f32> = reference.iter().map(|&r| -r).collect();
        assert_eq!(out, expected, "per-sample reference alignment is wrong");
    }

    #[test]
    fn leakage_decays_weights_when_step_size_is_zero() {
        // "Adaptation disabled" per the leakage-bound property (spec.md §8,
        // property 7) means the step size is zeroed via config while the
        // reference stays live and `adapt` stays true — not a DTD freeze
        // (`adapt = false`), which gates leakage off entirely (property 4).
        let params = NlmsParams {
            step_size: 0.0,
            ..default_params()
        };
        let mut filter = NlmsFilter::new(16, params);
        for w in &mut filter.taps {
            *w = 1.0;
        }
        let mut line = DelayLine::new(64).unwrap();
        let block = 8;
        let blocks = 10;
        let reference = vec![0.3f32; block];
        let mic = vec![0.0f32; block];
        let mut out = vec![0.0f32; block];

        let initial_norm: f32 = filter.taps().iter().map(|w| w * w).sum::<f32>().sqrt();
        for _ in 0..blocks {
            line.write_block(&reference);
            filter.process_block(&mic, &line, 0, true, &mut out);
        }
        let final_norm: f32 = filter.taps().iter().map(|w| w * w).sum::<f32>().sqrt();
        let expected_norm = initial_norm * params.leakage.powi((block * blocks) as i32);
        assert!(
            (final_norm - expected_norm).abs() < 1e-4,
            "final_norm={final_norm}, expected={expected_norm}"
        );
        assert!(final_norm <= initial_norm);
    }

    #[test]
    fn double_talk_freeze_leaves_taps_exactly_unchanged() {
        // With `adapt = false` (DTD freeze) the gate never opens regardless
        // of reference activity, so taps must not drift at all — not even
        // via leakage. This is testable property 4's zero-drift limit.
        let mut filter = NlmsFilter::new(16, default_params());
        for w in &mut filter.taps {
            *w = 1.0;
        }
        let mut line = DelayLine::new(64).unwrap();
        let block = 8;
        let reference: Vec<f32> = (0..block).map(|i| (i as f32 * 0.7).sin() * 0.5).collect();
        let mic: Vec<f32> = (0..block).map(|i| (i as f32 * 1.3).cos() * 0.9).collect();
        let mut out = vec![0.0f32; block];

        for _ in 0..200 {
            line.write_block(&reference);
            filter.process_block(&mic, &line, 0, false, &mut out);
        }
        assert!(filter.taps().iter().all(|&w| w == 1.0));
    }

    #[test]
    fn noise_gate_blocks_adaptation_on_near_zero_reference() {
        let mut filter = NlmsFilter::new(8, default_params());
        let mut line = DelayLine::new(64).unwrap();
        line.write_block(&[1e-6; 8]);
        let mic = vec![1.0f32; 8];
        let mut out = vec![0.0f32; 8];

        filter.process_block(&mic, &line, 0, true, &mut out);
        assert!(filter.taps().iter().all(|&w| w == 0.0));
    }

    #[test]
    fn reset_zeroes_taps_and_power() {
        let mut filter = NlmsFilter::new(8, default_params());
        for w in &mut filter.taps {
            *w = 3.0;
        }
        filter.power = 10.0;
        filter.reset();
        assert!(filter.taps().iter().all(|&w| w == 0.0));
        assert_eq!(filter.power, 1e-6);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Testable property 7 (spec.md §8): with the gate held open
            /// (constant nonzero reference) but `step_size` zeroed, leakage
            /// alone bounds `‖w(T)‖` by `‖w(0)‖ · λ^(T·N)`.
            #[test]
            fn leakage_bound_holds_with_zero_step_size(
                initial_tap in 0.01f32..5.0,
                leakage in 0.999f32..1.0,
                blocks in 1usize..20,
            ) {
                let block = 8;
                let params = NlmsParams { step_size: 0.0, leakage, regularization: 1e-6 };
                let mut filter = NlmsFilter::new(4, params);
                for w in filter.taps.iter_mut() {
                    *w = initial_tap;
                }
                let mut line = DelayLine::new(64).unwrap();
                let reference = vec![0.5f32; block];
                let mic = vec![0.0f32; block];
                let mut out = vec![0.0f32; block];

                let initial_norm = (initial_tap * initial_tap * filter.len() as f32).sqrt();
                for _ in 0..blocks {
                    line.write_block(&reference);
                    filter.process_block(&mic, &line, 0, true, &mut out);
                }
                let final_norm: f32 = filter.taps().iter().map(|w| w * w).sum::<f32>().sqrt();
                let bound = initial_norm * leakage.powi((block * blocks) as i32);
                prop_assert!(final_norm <= bound + 1e-4);
            }
        }
    }
}
