//! Capture a stereo input device (channel 0 = microphone, channel 1 = far-end
//! reference loopback), drive it through [`BlockProcessor`], and write the
//! cleaned mono signal to a WAV file alongside the raw microphone signal.
//!
//! ```sh
//! cargo run -p aec --example capture --features examples -- --duration 5
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::WavWriter;
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Observer, Producer, Split};

use aec::{BlockProcessor, Config, messages::ControlMessage};

const SAMPLE_RATE: u32 = 48_000;
const BLOCK_SIZE: usize = 128;

#[derive(Parser, Debug)]
#[command(about = "Capture a stereo mic+reference stream and cancel the echo live")]
struct Args {
    /// Recording duration in seconds.
    #[arg(short, long, default_value_t = 5)]
    duration: u64,

    /// Path for the cleaned (echo-cancelled) recording.
    #[arg(long, default_value = "cleaned.wav")]
    output: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let running = Arc::new(AtomicBool::new(true));

    ctrlc::set_handler({
        let running = running.clone();
        move || running.store(false, Ordering::SeqCst)
    })?;

    let host = cpal::default_host();
    let input_device = host
        .default_input_device()
        .context("no input device available")?;
    println!("Capturing from: {}", input_device.name()?);

    let cpal_config = cpal::StreamConfig {
        channels: 2,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    };

    let ring_size = BLOCK_SIZE * 2 * 8;
    let (mut prod, mut cons) = HeapRb::<f32>::new(ring_size).split();

    let input_stream = input_device.build_input_stream(
        &cpal_config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            prod.push_slice(data);
        },
        |err| eprintln!("input error: {err}"),
        None,
    )?;
    input_stream.play()?;

    let config = Config {
        sample_rate_hz: SAMPLE_RATE,
        block_size: BLOCK_SIZE,
        ..Default::default()
    };
    let (mut processor, mut handle) = BlockProcessor::new(config)?;
    handle
        .send(ControlMessage::Start)
        .map_err(|_| anyhow::anyhow!("control queue full"))?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&args.output, spec)?;

    println!(
        "Processing for {} seconds (Ctrl+C to stop early)...",
        args.duration
    );

    let deadline = Instant::now() + Duration::from_secs(args.duration);
    let mut interleaved = vec![0.0f32; BLOCK_SIZE * 2];
    let mut mic = vec![0.0f32; BLOCK_SIZE];
    let mut reference = vec![0.0f32; BLOCK_SIZE];
    let mut clean = vec![0.0f32; BLOCK_SIZE];

    while running.load(Ordering::SeqCst) && Instant::now() < deadline {
        if cons.occupied_len() < interleaved.len() {
            thread::sleep(Duration::from_millis(1));
            continue;
        }
        cons.pop_slice(&mut interleaved);

        for i in 0..BLOCK_SIZE {
            mic[i] = interleaved[2 * i];
            reference[i] = interleaved[2 * i + 1];
        }

        processor.process(&mic, &reference, &mut clean);

        for response in handle.drain_responses() {
            if let aec::messages::Response::Metrics(m) = response {
                print!(
                    "\rERLE: {:5.1} dB  delay: {:4} samples",
                    m.average_erle_db, m.estimated_delay
                );
            }
        }

        for &s in &clean {
            writer.write_sample(s)?;
        }
    }

    writer.finalize()?;
    println!("\nWrote {}", args.output);

    Ok(())
}
