#![no_main]

use aec::{Config, ConfigDelta, EchoCanceller};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

const BLOCK_SIZE: usize = 32;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    deltas: Vec<FuzzDelta>,
    /// Audio samples to process between config changes; consumed one
    /// block per delta.
    mic: Vec<f32>,
    reference: Vec<f32>,
}

#[derive(Debug, Arbitrary)]
struct FuzzDelta {
    step_size: Option<u8>,
    leakage: Option<u8>,
    regularization: Option<u8>,
    power_ratio_threshold: Option<u8>,
    correlation_threshold: Option<u8>,
    hangover_samples: Option<u16>,
}

/// Maps a fuzzed byte onto `[0, 2]`, covering zero, the valid interior, and
/// values outside any invariant a single field is expected to hold.
fn unit_interval(raw: u8) -> f32 {
    (raw as f32 / 255.0) * 2.0
}

fn to_delta(fuzzed: &FuzzDelta) -> ConfigDelta {
    ConfigDelta {
        step_size: fuzzed.step_size.map(unit_interval),
        leakage: fuzzed.leakage.map(unit_interval),
        regularization: fuzzed.regularization.map(unit_interval),
        power_ratio_threshold: fuzzed.power_ratio_threshold.map(unit_interval),
        correlation_threshold: fuzzed.correlation_threshold.map(unit_interval),
        hangover_samples: fuzzed.hangover_samples.map(u32::from),
    }
}

fuzz_target!(|input: FuzzInput| {
    let config = Config {
        block_size: BLOCK_SIZE,
        filter_length: 64,
        max_delay: 16,
        ..Default::default()
    };
    let mut aec = EchoCanceller::new(config).unwrap();

    let n = BLOCK_SIZE;
    let mut out = vec![0.0f32; n];
    let blocks = input.mic.len().min(input.reference.len()) / n;

    for (i, delta) in input.deltas.iter().enumerate().take(blocks) {
        // A live `set_config` call must never make `step_size` or
        // `leakage` fall outside the range `validate()` would have
        // rejected at construction time; the real-time path has no
        // opportunity to reject a bad delta.
        aec.set_config(to_delta(delta));

        let mic = &input.mic[i * n..(i + 1) * n];
        let reference = &input.reference[i * n..(i + 1) * n];
        let metrics = aec.process_block(mic, reference, &mut out).unwrap();

        assert!(out.iter().all(|s| s.is_finite()));
        assert!(metrics.erle_db >= 0.0 && metrics.erle_db <= 60.0);
    }
});
