//! Benchmarks for the echo cancellation pipeline and its components.

use aec::{Config, EchoCanceller};
use aec::internals::{DelayLine, DoubleTalkDetector, DtdParams, NlmsFilter, NlmsParams};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

// ---------------------------------------------------------------------------
// Full pipeline benchmarks
// ---------------------------------------------------------------------------

fn make_canceller(block_size: usize, filter_length: usize) -> EchoCanceller {
    let config = Config {
        block_size,
        filter_length,
        ..Default::default()
    };
    let mut aec = EchoCanceller::new(config).unwrap();

    let mic = vec![0.0f32; block_size];
    let reference: Vec<f32> = (0..block_size).map(|i| (i as f32 * 0.01).sin() * 0.1).collect();
    let mut clean = vec![0.0f32; block_size];
    for _ in 0..20 {
        let _ = aec.process_block(&mic, &reference, &mut clean);
    }
    aec
}

fn bench_process_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_block");

    for &(block_size, filter_length) in &[(128usize, 512usize), (256, 1024)] {
        let mut aec = make_canceller(block_size, filter_length);
        let mic: Vec<f32> = (0..block_size).map(|i| (i as f32 * 0.02).sin() * 0.2).collect();
        let reference: Vec<f32> = (0..block_size).map(|i| (i as f32 * 0.01).sin() * 0.1).collect();
        let mut clean = vec![0.0f32; block_size];

        group.bench_function(format!("n{block_size}_l{filter_length}"), |b| {
            b.iter(|| {
                aec.process_block(black_box(&mic), black_box(&reference), &mut clean)
                    .unwrap();
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Component benchmarks
// ---------------------------------------------------------------------------

fn bench_nlms_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("nlms_filter");
    let block_size = 128;
    let filter_length = 512;

    let mut filter = NlmsFilter::new(
        filter_length,
        NlmsParams {
            step_size: 0.1,
            leakage: 0.999_99,
            regularization: 1e-6,
        },
    );
    let mut line = DelayLine::new(filter_length + block_size).unwrap();
    let reference: Vec<f32> = (0..block_size).map(|i| (i as f32 * 0.01).sin() * 0.1).collect();
    let mic: Vec<f32> = (0..block_size).map(|i| (i as f32 * 0.02).sin() * 0.05).collect();
    let mut error = vec![0.0f32; block_size];
    line.write_block(&reference);

    group.bench_function("process_block_512_taps", |b| {
        b.iter(|| {
            line.write_block(black_box(&reference));
            filter.process_block(black_box(&mic), &line, 0, true, &mut error);
        });
    });

    group.finish();
}

fn bench_double_talk_detector(c: &mut Criterion) {
    let mut group = c.benchmark_group("double_talk_detector");
    let block_size = 128;

    let mut dtd = DoubleTalkDetector::new(
        512,
        DtdParams {
            power_ratio_threshold: 2.0,
            correlation_threshold: 0.6,
            hangover_samples: 2400,
        },
    );
    let mic: Vec<f32> = (0..block_size).map(|i| (i as f32 * 0.02).sin() * 0.05).collect();
    let reference: Vec<f32> = (0..block_size).map(|i| (i as f32 * 0.01).sin() * 0.1).collect();

    group.bench_function("process_512_window", |b| {
        b.iter(|| {
            dtd.process(black_box(&mic), black_box(&reference));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_process_block,
    bench_nlms_filter,
    bench_double_talk_detector,
);
criterion_main!(benches);
