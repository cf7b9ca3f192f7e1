#![no_main]

use aec::messages::ControlMessage;
use aec::{BlockProcessor, Config, ConfigDelta};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

const BLOCK_SIZE: usize = 16;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    ops: Vec<FuzzOp>,
    mic: Vec<f32>,
    reference: Vec<f32>,
}

#[derive(Debug, Arbitrary)]
enum FuzzOp {
    Start,
    Stop,
    Reset,
    GetMetrics,
    SetConfig {
        step_size: Option<u8>,
        leakage: Option<u8>,
        hangover_samples: Option<u16>,
    },
    Process,
}

fn unit_interval(raw: u8) -> f32 {
    (raw as f32 / 255.0) * 2.0
}

/// Drives a [`BlockProcessor`] through an arbitrary sequence of control
/// messages interleaved with block processing, the way a capture thread
/// and its session-management thread would race against each other.
/// Never expected to panic, deadlock, or leave `clean_out` non-finite.
fuzz_target!(|input: FuzzInput| {
    let config = Config {
        block_size: BLOCK_SIZE,
        filter_length: 32,
        max_delay: 8,
        metrics_interval: 64,
        ..Default::default()
    };
    let (mut processor, mut handle) = match BlockProcessor::new(config) {
        Ok(pair) => pair,
        Err(_) => return,
    };

    let n = BLOCK_SIZE;
    let mut out = vec![0.0f32; n];
    let blocks = input.mic.len().min(input.reference.len()) / n;
    let mut block_idx = 0usize;

    for op in &input.ops {
        match op {
            FuzzOp::Start => {
                let _ = handle.send(ControlMessage::Start);
            }
            FuzzOp::Stop => {
                let _ = handle.send(ControlMessage::Stop);
            }
            FuzzOp::Reset => {
                let _ = handle.send(ControlMessage::Reset);
            }
            FuzzOp::GetMetrics => {
                let _ = handle.send(ControlMessage::GetMetrics);
            }
            FuzzOp::SetConfig { step_size, leakage, hangover_samples } => {
                let delta = ConfigDelta {
                    step_size: step_size.map(unit_interval),
                    leakage: leakage.map(unit_interval),
                    hangover_samples: hangover_samples.map(u32::from),
                    ..Default::default()
                };
                let _ = handle.send(ControlMessage::SetConfig(delta));
            }
            FuzzOp::Process => {
                if block_idx >= blocks {
                    continue;
                }
                let mic = &input.mic[block_idx * n..(block_idx + 1) * n];
                let reference = &input.reference[block_idx * n..(block_idx + 1) * n];
                block_idx += 1;
                processor.process(mic, reference, &mut out);
                assert!(out.iter().all(|s| s.is_finite()));
            }
        }
        let _ = handle.drain_responses();
    }
});
