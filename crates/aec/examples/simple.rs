//! Minimal echo cancellation demo.
//!
//! Generates a synthetic far-end reference and a microphone signal that
//! leaks an echo of it, processes both through the canceller, and reports
//! how much echo was removed.
//!
//! ```sh
//! cargo run -p aec --example simple
//! ```

use aec::{Config, EchoCanceller};

fn main() {
    let config = Config::default();
    let block_size = config.block_size;
    let mut canceller = EchoCanceller::new(config).expect("default config is valid");

    let num_blocks = 80;
    let mut rng_state = 0x2545f491_4f6cdd1du64;
    let mut next_sample = || {
        rng_state ^= rng_state << 13;
        rng_state ^= rng_state >> 7;
        rng_state ^= rng_state << 17;
        ((rng_state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
    };

    let mut history: Vec<f32> = Vec::new();
    let path_delay = 40;
    let mut clean = vec![0.0f32; block_size];
    let mut last_erle = 0.0f32;

    for _ in 0..num_blocks {
        let reference: Vec<f32> = (0..block_size).map(|_| next_sample() * 0.5).collect();
        history.extend_from_slice(&reference);

        let base = history.len() - block_size;
        let mic: Vec<f32> = (0..block_size)
            .map(|n| {
                let idx = base + n;
                if idx >= path_delay {
                    0.6 * history[idx - path_delay]
                } else {
                    0.0
                }
            })
            .collect();

        let metrics = canceller
            .process_block(&mic, &reference, &mut clean)
            .expect("block sizes match configuration");
        last_erle = metrics.erle_db;
    }

    println!(
        "Processed {} blocks of {} samples. Final ERLE: {:.1} dB",
        num_blocks, block_size, last_erle
    );
    assert!(
        last_erle > 10.0,
        "expected the canceller to have converged by now"
    );
}
