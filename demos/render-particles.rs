//! Renders the particle reverb's response to a few stereo noise bursts into a wav file.

use std::{io, path::PathBuf};

use arg::{parse_args, Args};
use rand::{rngs::SmallRng, Rng, SeedableRng};

use particle_reverb::{
    effects::{ParticleReverbConfig, ParticleReverbEffect},
    Effect, EffectTime, Error,
};

// -------------------------------------------------------------------------------------------------

#[cfg(all(debug_assertions, feature = "assert-allocs"))]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

// -------------------------------------------------------------------------------------------------

const DEFAULT_LOG_LEVEL: log::Level = if cfg!(debug_assertions) {
    log::Level::Debug
} else {
    log::Level::Warn
};

const SAMPLE_RATE: u32 = 48000;
const CHANNEL_COUNT: usize = 2;
const BUFFER_SIZE_FRAMES: usize = 512;

/// Start times and lengths of the noise bursts in seconds.
const BURSTS: [(f32, f32); 3] = [(0.0, 2.0), (2.5, 0.05), (3.0, 0.3)];

// -------------------------------------------------------------------------------------------------

/// Arguments for the particle rendering demo.
#[derive(Args, Debug)]
struct Arguments {
    #[arg(short = "o", long = "output")]
    /// Write the rendered reverb into the given wav file (default: \"particles.wav\")
    output_path: Option<PathBuf>,
    #[arg(long = "seconds")]
    /// Rendered duration in seconds (default: 8)
    seconds: Option<f32>,
    #[arg(long = "seed")]
    /// Random seed for deterministic renderings
    seed: Option<u64>,
    #[arg(short = "l", long = "log-level")]
    /// Set logging level to \"debug\", \"info\", \"warn\" or \"error\".
    log_level: Option<log::Level>,
}

// -------------------------------------------------------------------------------------------------

// Hamming-windowed white noise burst, added to the given interleaved buffer
fn add_noise_burst(
    buffer: &mut [f32],
    start_frame: usize,
    length_frames: usize,
    rng: &mut impl Rng,
) {
    let frame_count = buffer.len() / CHANNEL_COUNT;
    let end_frame = (start_frame + length_frames).min(frame_count);
    for frame in start_frame..end_frame {
        let phase = (frame - start_frame) as f32 / length_frames.max(2) as f32;
        let window = 0.54 - 0.46 * (std::f32::consts::TAU * phase).cos();
        for channel in 0..CHANNEL_COUNT {
            buffer[frame * CHANNEL_COUNT + channel] += 0.25 * window * rng.random_range(-1.0..1.0);
        }
    }
}

// -------------------------------------------------------------------------------------------------

fn main() -> Result<(), Error> {
    let args = parse_args::<Arguments>();

    simple_logger::SimpleLogger::new()
        .with_level(args.log_level.unwrap_or(DEFAULT_LOG_LEVEL).to_level_filter())
        .init()
        .expect("Failed to set logger");

    let output_path = args
        .output_path
        .unwrap_or_else(|| PathBuf::from("particles.wav"));
    let seconds = args.seconds.unwrap_or(8.0).max(0.0);
    let seed = args.seed.unwrap_or(0x5eed);

    // Create input signal
    let frame_count = (seconds * SAMPLE_RATE as f32) as usize;
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut buffer = vec![0.0_f32; frame_count * CHANNEL_COUNT];
    for (start, length) in BURSTS {
        add_noise_burst(
            &mut buffer,
            (start * SAMPLE_RATE as f32) as usize,
            (length * SAMPLE_RATE as f32) as usize,
            &mut rng,
        );
    }

    // Apply reverb
    let mut effect = ParticleReverbEffect::with_config(ParticleReverbConfig::default()).with_seed(seed);
    effect.initialize(SAMPLE_RATE, CHANNEL_COUNT, BUFFER_SIZE_FRAMES)?;
    log::info!(
        "Rendering {seconds} seconds with a tail of {} frames",
        effect.process_tail().unwrap_or(0)
    );
    for (index, block) in buffer
        .chunks_mut(BUFFER_SIZE_FRAMES * CHANNEL_COUNT)
        .enumerate()
    {
        let time = EffectTime::new((index * BUFFER_SIZE_FRAMES) as u64);
        effect.process(block, &time);
    }

    // Write result
    let peak = buffer.iter().fold(0.0_f32, |peak, s| peak.max(s.abs()));
    if peak > 1.0 {
        log::warn!("Output peaks at {peak:.2}: normalizing");
        buffer.iter_mut().for_each(|s| *s /= peak);
    }
    let spec = hound::WavSpec {
        channels: CHANNEL_COUNT as u16,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&output_path, spec).map_err(io::Error::other)?;
    for sample in buffer {
        writer.write_sample(sample).map_err(io::Error::other)?;
    }
    writer.finalize().map_err(io::Error::other)?;
    log::info!("Wrote {}", output_path.display());

    Ok(())
}
