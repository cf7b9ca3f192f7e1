#![no_main]

use aec::{Config, EchoCanceller};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

/// Construction-time parameters worth varying; block sizes and filter
/// lengths are kept small so a single fuzz iteration stays cheap.
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    block_size_idx: u8,
    filter_length_idx: u8,
    max_delay_idx: u8,
    step_size_raw: u8,
    leakage_raw: u8,
    /// Flat mic/reference samples, consumed one block at a time; any
    /// shortfall on the final block is simply not run.
    mic: Vec<f32>,
    reference: Vec<f32>,
}

fn block_size(idx: u8) -> usize {
    match idx % 4 {
        0 => 8,
        1 => 16,
        2 => 32,
        _ => 64,
    }
}

fn filter_length(idx: u8) -> usize {
    match idx % 3 {
        0 => 16,
        1 => 32,
        _ => 64,
    }
}

fn max_delay(idx: u8) -> u32 {
    (idx % 17) as u32
}

/// Maps a fuzzed byte onto `[0, 2]`, covering zero, the valid interior, and
/// the out-of-range tail `validate()` must reject.
fn unit_interval(raw: u8) -> f32 {
    (raw as f32 / 255.0) * 2.0
}

fuzz_target!(|input: FuzzInput| {
    let config = Config {
        block_size: block_size(input.block_size_idx),
        filter_length: filter_length(input.filter_length_idx),
        max_delay: max_delay(input.max_delay_idx),
        step_size: unit_interval(input.step_size_raw).max(f32::EPSILON),
        leakage: unit_interval(input.leakage_raw),
        ..Default::default()
    };

    let mut aec = match EchoCanceller::new(config) {
        Ok(aec) => aec,
        Err(_) => return,
    };

    let n = config.block_size;
    let mut out = vec![0.0f32; n];
    let blocks = input.mic.len().min(input.reference.len()) / n;
    for i in 0..blocks {
        let mic = &input.mic[i * n..(i + 1) * n];
        let reference = &input.reference[i * n..(i + 1) * n];
        let metrics = aec.process_block(mic, reference, &mut out).unwrap();

        assert_eq!(out.len(), n);
        assert!(metrics.erle_db.is_finite());
        assert!(out.iter().all(|s| s.is_finite()));
    }
});
