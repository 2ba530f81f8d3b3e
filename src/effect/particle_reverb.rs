//! Granular "particle" reverb: a dense cloud of windowed, delayed taps into the input's recent
//! history, summed into a textured reverberant tail.

use std::any::Any;

use assume::assume;
use rand::{rngs::SmallRng, SeedableRng};

use crate::{
    effect::{Effect, EffectMessage, EffectMessagePayload, EffectTime},
    utils::{
        buffer::{clear_buffer, InterleavedBufferMut},
        dsp::window::WindowTable,
    },
    Error, Parameter,
};

// -------------------------------------------------------------------------------------------------

mod capture;
mod config;
mod pool;
mod random;

pub use capture::CaptureBuffer;
pub use config::{ParticleReverbConfig, SampleSizes};
pub use pool::{Particle, ParticleDraw, ParticlePool};
pub use random::{FixedSequenceRandom, GrainRandom};

// -------------------------------------------------------------------------------------------------

/// Message type for `ParticleReverbEffect`.
#[derive(Clone, Debug)]
pub enum ParticleReverbMessage {
    /// Clear the capture history and retire all particles.
    Reset,
}

impl EffectMessage for ParticleReverbMessage {
    fn effect_name(&self) -> &'static str {
        ParticleReverbEffect::EFFECT_NAME
    }
    fn payload(&self) -> &dyn Any {
        self
    }
}

// -------------------------------------------------------------------------------------------------

/// Stereo particle reverb block processor.
///
/// The processor continuously captures its input into a [`CaptureBuffer`]. Once per render
/// quantum of `block_size` frames it mints a new [`Particle`] into the [`ParticlePool`]: a tap
/// into the capture history with randomly drawn length, delay and volume, shaped by one of the
/// [`WindowTable`]'s shapes. The output is the plain sum of all particles in flight. There's no
/// normalization by the number of particles, so the output level grows with `poly`.
///
/// Output is fully wet. Minting starts with the quantum which completes a warm-up period of
/// `length_max_sec`, and only while the capture history at the quantum's start contains anything
/// audible.
///
/// All memory is allocated on creation: processing never allocates.
pub struct ParticleReverb<R: GrainRandom = SmallRng> {
    config: ParticleReverbConfig,
    sizes: SampleSizes,
    window: WindowTable,
    capture: CaptureBuffer<2>,
    pool: ParticlePool,
    random: R,
    block_counter: u64,
    quantum_pos: usize,
}

impl ParticleReverb<SmallRng> {
    /// Create a new processor for the given sample rate, using an OS-seeded random generator.
    pub fn new(config: ParticleReverbConfig, sample_rate: u32) -> Result<Self, Error> {
        Self::with_random(config, sample_rate, SmallRng::from_os_rng())
    }

    /// Create a new processor which draws its particles from a seeded random generator.
    pub fn with_seed(config: ParticleReverbConfig, sample_rate: u32, seed: u64) -> Result<Self, Error> {
        Self::with_random(config, sample_rate, SmallRng::seed_from_u64(seed))
    }
}

impl<R: GrainRandom> ParticleReverb<R> {
    /// Create a new processor for the given sample rate, which draws its particles from the
    /// given random source.
    pub fn with_random(
        config: ParticleReverbConfig,
        sample_rate: u32,
        random: R,
    ) -> Result<Self, Error> {
        config.validate(sample_rate)?;
        let sizes = config.sample_sizes(sample_rate);
        log::debug!(
            "Creating particle reverb: {} Hz, {} particles, capture {} frames, \
            length max {} frames, delay max {} frames",
            sample_rate,
            config.poly,
            sizes.capture_len,
            sizes.length_max,
            sizes.delay_max
        );
        let window = WindowTable::new(config.window_size, config.window_shapes);
        let capture = CaptureBuffer::new(sizes.capture_len);
        let pool = ParticlePool::new(config.poly);
        Ok(Self {
            config,
            sizes,
            window,
            capture,
            pool,
            random,
            block_counter: 0,
            quantum_pos: 0,
        })
    }

    /// The processor's configuration.
    pub fn config(&self) -> &ParticleReverbConfig {
        &self.config
    }

    /// The configuration's time values in sample frames.
    pub fn sample_sizes(&self) -> &SampleSizes {
        &self.sizes
    }

    /// The particle window shapes.
    pub fn window(&self) -> &WindowTable {
        &self.window
    }

    /// The input capture history.
    pub fn capture(&self) -> &CaptureBuffer<2> {
        &self.capture
    }

    /// The particle pool.
    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    /// Number of frames captured so far.
    pub fn frame_counter(&self) -> u64 {
        self.capture.frames_written()
    }

    /// Number of completed render quanta.
    pub fn block_counter(&self) -> u64 {
        self.block_counter
    }

    /// True when at least `length_max` frames of history got captured.
    pub fn is_warmed_up(&self) -> bool {
        self.capture.frames_written() >= self.sizes.length_max as u64
    }

    /// Number of frames the processor keeps producing output after its input went silent.
    pub fn tail_frames(&self) -> usize {
        let frames = self.sizes.delay_max + 2 * self.sizes.length_max;
        frames.div_ceil(self.config.block_size) * self.config.block_size
    }

    /// Clear the capture history, retire all particles and restart the warm-up period.
    pub fn reset(&mut self) {
        self.capture.flush();
        self.pool.retire_all();
        self.block_counter = 0;
        self.quantum_pos = 0;
    }

    /// Process an interleaved stereo buffer in place: the buffer's content is captured as input
    /// and then replaced with the particle mix.
    ///
    /// Buffers may have any number of frames: render quanta carry over across calls.
    pub fn process(&mut self, buffer: &mut [f32]) {
        debug_assert!(buffer.len() % 2 == 0, "Expecting whole stereo frames");
        let mut frames = buffer.as_frames_mut::<2>();
        while !frames.is_empty() {
            let starts_quantum = self.quantum_pos == 0;
            let chunk_len = frames.len().min(self.config.block_size - self.quantum_pos);
            let (chunk, rest) = std::mem::take(&mut frames).split_at_mut(chunk_len);
            self.process_chunk(chunk, starts_quantum);
            self.quantum_pos += chunk_len;
            if self.quantum_pos == self.config.block_size {
                self.quantum_pos = 0;
                self.block_counter += 1;
            }
            frames = rest;
        }
    }

    /// Produce output for a block without input: writes silence and leaves the processor's
    /// state untouched.
    pub fn process_absent(&self, buffer: &mut [f32]) {
        clear_buffer(buffer);
    }

    /// True when the quantum which starts at the current write head should mint a particle:
    /// the history is complete by the quantum's end and was audible at its start.
    fn should_mint(&self) -> bool {
        let quantum_end = self.capture.frames_written() + self.config.block_size as u64;
        quantum_end >= self.sizes.length_max as u64 && !self.capture.is_silent()
    }

    fn process_chunk(&mut self, frames: &mut [[f32; 2]], starts_quantum: bool) {
        // decided before capturing, so partial quanta decide alike
        let mint = starts_quantum && self.should_mint();
        for frame in frames.iter() {
            self.capture.write_frame(frame);
        }
        if mint {
            self.mint();
        }
        frames.fill([0.0; 2]);
        self.mix(frames);
    }

    fn mint(&mut self) {
        let draw = ParticleDraw::new(&mut self.random, &self.config, &self.sizes);
        self.pool.mint(&draw);
    }

    fn mix(&mut self, frames: &mut [[f32; 2]]) {
        let frame_count = frames.len();
        let window_size = self.window.window_size();
        for particle in self.pool.slots_mut() {
            if !particle.is_active() {
                continue;
            }
            let count = frame_count.min(particle.remaining());
            // frame i of this chunk reads the frame captured `delay` frames before it
            let start_offset_back = frame_count + particle.delay();
            let (left_head, left_tail) = self.capture.slices(0, start_offset_back, count);
            let (right_head, right_tail) = self.capture.slices(1, start_offset_back, count);
            let left = left_head.iter().chain(left_tail);
            let right = right_head.iter().chain(right_tail);

            let cursor = particle.cursor();
            let shape = particle.shape();
            let volume = particle.volume();
            for (index, ((frame, left), right)) in frames.iter_mut().zip(left).zip(right).enumerate()
            {
                let phase = particle.window_phase(cursor + index, window_size);
                assume!(unsafe: phase < window_size, "Particle frames are < particle length");
                let gain = self.window.lookup(phase, shape) * volume;
                frame[0] += left * gain;
                frame[1] += right * gain;
            }
            particle.advance(count);
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Stereo particle reverb effect.
///
/// Wraps a [`ParticleReverb`] processor, which gets created when the effect is initialized.
/// Only stereo I/O is supported: with any other channel layout, the effect passes its input
/// through unchanged.
pub struct ParticleReverbEffect {
    config: ParticleReverbConfig,
    seed: Option<u64>,
    reverb: Option<ParticleReverb>,
}

impl ParticleReverbEffect {
    pub const EFFECT_NAME: &str = "ParticleReverb";

    /// Creates a new `ParticleReverbEffect` with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ParticleReverbConfig::default())
    }

    /// Creates a new `ParticleReverbEffect` with the given configuration. The configuration gets
    /// validated when the effect is initialized.
    pub fn with_config(config: ParticleReverbConfig) -> Self {
        Self {
            config,
            seed: None,
            reverb: None,
        }
    }

    /// Use a fixed random seed for the particle draws, to get reproducible renderings.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The effect's configuration.
    pub fn config(&self) -> &ParticleReverbConfig {
        &self.config
    }

    /// The effect's processor. `None` before initialization or when running in passthrough mode.
    pub fn reverb(&self) -> Option<&ParticleReverb> {
        self.reverb.as_ref()
    }
}

impl Default for ParticleReverbEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for ParticleReverbEffect {
    fn name(&self) -> &'static str {
        Self::EFFECT_NAME
    }

    fn parameters(&self) -> Vec<&dyn Parameter> {
        ParticleReverbConfig::parameters()
    }

    fn initialize(
        &mut self,
        sample_rate: u32,
        channel_count: usize,
        max_frames: usize,
    ) -> Result<(), Error> {
        self.reverb = None;
        if max_frames == 0 {
            log::warn!("Failed to initialize {}: max frames must be > 0", self.name());
            return Err(Error::ParameterError(
                "Max frames per buffer must be > 0".to_string(),
            ));
        }
        if channel_count != 2 {
            log::warn!(
                "{} only supports stereo I/O, passing through {} channel(s) unchanged",
                self.name(),
                channel_count
            );
            return Ok(());
        }
        let config = self.config.clone();
        let reverb = match self.seed {
            Some(seed) => ParticleReverb::with_seed(config, sample_rate, seed),
            None => ParticleReverb::new(config, sample_rate),
        }
        .inspect_err(|err| log::warn!("Failed to initialize {}: {err}", self.name()))?;
        log::info!(
            "Initialized {} at {} Hz for up to {} frames per buffer, tail {} frames",
            self.name(),
            sample_rate,
            max_frames,
            reverb.tail_frames()
        );
        self.reverb = Some(reverb);
        Ok(())
    }

    fn process(&mut self, output: &mut [f32], _time: &EffectTime) {
        if let Some(reverb) = &mut self.reverb {
            reverb.process(output);
        }
    }

    fn process_tail(&self) -> Option<usize> {
        Some(self.reverb.as_ref().map_or(0, |reverb| reverb.tail_frames()))
    }

    fn process_message(&mut self, message: &EffectMessagePayload) -> Result<(), Error> {
        if let Some(message) = message.payload().downcast_ref::<ParticleReverbMessage>() {
            match message {
                ParticleReverbMessage::Reset => {
                    if let Some(reverb) = &mut self.reverb {
                        reverb.reset();
                    }
                }
            }
            Ok(())
        } else {
            Err(Error::MessageError(
                "ParticleReverbEffect: Invalid/unknown message payload".to_owned(),
            ))
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use rand::Rng;

    use crate::utils::buffer::{is_silent, InterleavedBuffer};

    /// Small config at a 1 kHz sample rate: 500 frames warm-up, 200 frames max delay.
    fn small_config() -> ParticleReverbConfig {
        ParticleReverbConfig {
            window_size: 64,
            window_shapes: 8,
            poly: 8,
            block_size: 10,
            capture_sec: 1.0,
            length_max_sec: 0.5,
            delay_max_sec: 0.2,
            ..Default::default()
        }
    }
    const SMALL_SAMPLE_RATE: u32 = 1000;

    fn noise(seed: u64, frames: usize) -> Vec<f32> {
        let mut rng = SmallRng::seed_from_u64(seed);
        (0..frames * 2)
            .map(|_| rng.random_range(-1.0..1.0))
            .collect()
    }

    fn process_in_blocks<R: GrainRandom>(
        reverb: &mut ParticleReverb<R>,
        input: &[f32],
        block_frames: usize,
    ) -> Vec<f32> {
        let mut output = input.to_vec();
        for block in output.chunks_mut(block_frames * 2) {
            #[cfg(feature = "assert-allocs")]
            assert_no_alloc::assert_no_alloc(|| reverb.process(block));
            #[cfg(not(feature = "assert-allocs"))]
            reverb.process(block);
        }
        output
    }

    #[test]
    fn silent_until_warmed_up() -> Result<(), Error> {
        let mut reverb = ParticleReverb::with_seed(small_config(), SMALL_SAMPLE_RATE, 1)?;
        let input = noise(2, 600);
        let output = process_in_blocks(&mut reverb, &input[..490 * 2], 10);
        assert!(is_silent(&output));
        assert!(!reverb.is_warmed_up());
        assert_eq!(reverb.pool().mint_counter(), 0);
        assert_eq!(reverb.block_counter(), 49);

        let output = process_in_blocks(&mut reverb, &input[490 * 2..], 10);
        assert!(reverb.is_warmed_up());
        assert_eq!(reverb.pool().mint_counter(), 11);
        assert!(!is_silent(&output));
        Ok(())
    }

    #[test]
    fn pool_fills_and_wraps() -> Result<(), Error> {
        let config = small_config();
        let poly = config.poly;
        let mut reverb =
            ParticleReverb::with_random(config, SMALL_SAMPLE_RATE, FixedSequenceRandom::constant(0.5))?;
        let input = noise(3, 500 + poly * 10 + 10);

        // warm-up: the last warm-up block mints the first particle
        process_in_blocks(&mut reverb, &input[..490 * 2], 10);
        assert_eq!(reverb.pool().mint_counter(), 0);

        let mut pos = 490 * 2;
        for block in 0..poly {
            process_in_blocks(&mut reverb, &input[pos..pos + 20], 10);
            pos += 20;
            assert_eq!(reverb.pool().mint_counter(), block as u64 + 1);
        }
        let slots = reverb.pool().slots();
        assert!(slots.iter().all(|p| p.is_active()));
        for (index, particle) in slots.iter().enumerate() {
            assert_eq!(particle.cursor(), (poly - index) * 10);
        }

        // the next mint overwrites slot 0
        process_in_blocks(&mut reverb, &input[pos..pos + 20], 10);
        let slots = reverb.pool().slots();
        assert_eq!(slots[0].cursor(), 10);
        assert_eq!(slots[1].cursor(), poly * 10);
        assert_eq!(reverb.pool().mint_counter(), poly as u64 + 1);
        Ok(())
    }

    #[test]
    fn particles_retire_when_finished() -> Result<(), Error> {
        let config = ParticleReverbConfig {
            poly: 64,
            ..small_config()
        };
        let mut reverb =
            ParticleReverb::with_random(config, SMALL_SAMPLE_RATE, FixedSequenceRandom::constant(0.0))?;
        // shortest particles: 400 frames
        let input = noise(4, 1200);
        process_in_blocks(&mut reverb, &input, 10);
        let slots = reverb.pool().slots();
        assert!(slots.iter().all(|p| p.cursor() <= p.length()));
        assert!(slots
            .iter()
            .filter(|p| p.length() > 0)
            .all(|p| p.is_active() == (p.cursor() < p.length())));
        // particles minted more than 400 frames ago have finished
        assert!(slots.iter().any(|p| p.length() > 0 && !p.is_active()));
        Ok(())
    }

    #[test]
    fn deterministic_with_fixed_random() -> Result<(), Error> {
        let input = noise(5, 2000);
        let sequence = FixedSequenceRandom::new(vec![0.1, 0.9, 0.4, 0.7, 0.25]);
        let mut reverb_a =
            ParticleReverb::with_random(small_config(), SMALL_SAMPLE_RATE, sequence.clone())?;
        let mut reverb_b = ParticleReverb::with_random(small_config(), SMALL_SAMPLE_RATE, sequence)?;
        let output_a = process_in_blocks(&mut reverb_a, &input, 10);
        let output_b = process_in_blocks(&mut reverb_b, &input, 10);
        assert!(!is_silent(&output_a));
        assert!(output_a
            .iter()
            .zip(&output_b)
            .all(|(a, b)| a.to_bits() == b.to_bits()));

        let mut reverb_c = ParticleReverb::with_seed(small_config(), SMALL_SAMPLE_RATE, 42)?;
        let mut reverb_d = ParticleReverb::with_seed(small_config(), SMALL_SAMPLE_RATE, 42)?;
        assert_eq!(
            process_in_blocks(&mut reverb_c, &input, 10),
            process_in_blocks(&mut reverb_d, &input, 10)
        );
        Ok(())
    }

    #[test]
    fn independent_of_host_buffer_size() -> Result<(), Error> {
        let input = noise(6, 2000);
        let mut reverb_a = ParticleReverb::with_seed(small_config(), SMALL_SAMPLE_RATE, 7)?;
        let mut reverb_b = ParticleReverb::with_seed(small_config(), SMALL_SAMPLE_RATE, 7)?;
        let output_a = process_in_blocks(&mut reverb_a, &input, 10);
        let output_b = process_in_blocks(&mut reverb_b, &input, 37);
        assert_eq!(output_a, output_b);
        assert_eq!(reverb_a.block_counter(), reverb_b.block_counter());
        assert_eq!(reverb_a.pool().mint_counter(), reverb_b.pool().mint_counter());
        Ok(())
    }

    #[test]
    fn silence_stays_silent() -> Result<(), Error> {
        let mut reverb = ParticleReverb::with_seed(ParticleReverbConfig::default(), 48000, 8)?;
        let input = vec![0.0; 48000 * 4 * 2];
        let output = process_in_blocks(&mut reverb, &input, 128);
        assert!(is_silent(&output));
        assert_eq!(reverb.pool().mint_counter(), 0);
        assert_eq!(reverb.frame_counter(), 48000 * 4);
        Ok(())
    }

    #[test]
    fn absent_input_keeps_state() -> Result<(), Error> {
        let mut reverb = ParticleReverb::with_seed(small_config(), SMALL_SAMPLE_RATE, 9)?;
        process_in_blocks(&mut reverb, &noise(10, 700), 10);
        let frames = reverb.frame_counter();
        let minted = reverb.pool().mint_counter();
        let mut buffer = vec![0.5; 20];
        reverb.process_absent(&mut buffer);
        assert!(is_silent(&buffer));
        assert_eq!(reverb.frame_counter(), frames);
        assert_eq!(reverb.pool().mint_counter(), minted);
        Ok(())
    }

    #[test]
    fn impulse_response() -> Result<(), Error> {
        const SAMPLE_RATE: u32 = 48000;
        let config = ParticleReverbConfig {
            poly: 4,
            length_max_sec: 1.5,
            ..Default::default()
        };
        let mut reverb = ParticleReverb::with_random(
            config.clone(),
            SAMPLE_RATE,
            FixedSequenceRandom::constant(0.5),
        )?;
        let sizes = *reverb.sample_sizes();
        let draw = ParticleDraw::new(&mut FixedSequenceRandom::constant(0.5), &config, &sizes);

        // silence past the warm-up period, then a left channel impulse
        let impulse_frame = 80000;
        let total_frames = impulse_frame + draw.delay + 1000;
        let mut input = vec![0.0; total_frames * 2];
        input[impulse_frame * 2] = 1.0;

        let output = process_in_blocks(&mut reverb, &input, 128);
        let audible = output
            .as_frames::<2>()
            .iter()
            .enumerate()
            .filter(|(_, frame)| frame[0] != 0.0 || frame[1] != 0.0)
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        assert_eq!(audible, vec![impulse_frame + draw.delay]);

        let delay_sec = draw.delay as f32 / SAMPLE_RATE as f32;
        assert!(delay_sec >= config.delay_min_rate * config.delay_max_sec);
        assert!(delay_sec <= (config.delay_min_rate + config.delay_range) * config.delay_max_sec);

        let frame = &output[audible[0] * 2..audible[0] * 2 + 2];
        let peak = config.poly as f32
            * (config.volume_min_rate + config.volume_range)
            * reverb.window().amplitude(draw.shape);
        assert!(frame[0] > 0.0 && frame[0] <= peak);
        assert_eq!(frame[1], 0.0);
        Ok(())
    }

    #[test]
    fn single_particle_impulse_response() -> Result<(), Error> {
        const SAMPLE_RATE: u32 = 48000;
        let config = ParticleReverbConfig {
            poly: 1,
            length_max_sec: 1.5,
            ..Default::default()
        };
        let mut reverb = ParticleReverb::with_random(
            config.clone(),
            SAMPLE_RATE,
            FixedSequenceRandom::constant(0.5),
        )?;
        let sizes = *reverb.sample_sizes();
        let draw = ParticleDraw::new(&mut FixedSequenceRandom::constant(0.5), &config, &sizes);

        let impulse_frame = 80000;
        let total_frames = impulse_frame + draw.delay + 1000;
        let mut input = vec![0.0; total_frames * 2];
        input[impulse_frame * 2] = 1.0;
        input[impulse_frame * 2 + 1] = 1.0;

        let output = process_in_blocks(&mut reverb, &input, 128);
        assert_eq!(reverb.pool().active_count(), 1);
        let audible = output
            .as_frames::<2>()
            .iter()
            .enumerate()
            .filter(|(_, frame)| frame[0] != 0.0 || frame[1] != 0.0)
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        assert_eq!(audible, vec![impulse_frame + draw.delay]);

        // a single particle is bounded by its drawn volume and window peak
        let amplitude = reverb.window().amplitude(draw.shape);
        let frame = &output[audible[0] * 2..audible[0] * 2 + 2];
        for sample in frame {
            assert!(*sample > 0.0);
            assert!(*sample <= draw.volume * amplitude);
            assert!(*sample <= (config.volume_min_rate + config.volume_range) * amplitude);
        }
        assert_eq!(frame[0], frame[1]);
        Ok(())
    }

    #[test]
    fn warm_up_quantum_split_across_host_buffers() -> Result<(), Error> {
        fn render(input: &[f32], split_frame: usize) -> Result<(Vec<f32>, u64), Error> {
            let mut reverb = ParticleReverb::with_random(
                small_config(),
                SMALL_SAMPLE_RATE,
                FixedSequenceRandom::constant(0.5),
            )?;
            let mut output = input.to_vec();
            let (head, tail) = output.split_at_mut(split_frame * 2);
            reverb.process(head);
            reverb.process(tail);
            Ok((output, reverb.pool().mint_counter()))
        }

        // host buffer ends inside the quantum which completes the warm-up
        let input = vec![0.5; 520 * 2];
        let (whole, whole_mints) = render(&input, 520)?;
        let (split, split_mints) = render(&input, 492)?;
        assert_eq!(whole_mints, 3);
        assert_eq!(split_mints, whole_mints);
        assert_eq!(split, whole);

        // input starts within a quantum after the warm-up: the silence gate opens with the
        // next quantum, no matter where the host splits
        let mut input = vec![0.0; 540 * 2];
        input[493 * 2..].fill(0.5);
        let (whole, whole_mints) = render(&input, 540)?;
        assert_eq!(whole_mints, 4);
        for split_frame in [491, 495, 500, 503] {
            let (split, split_mints) = render(&input, split_frame)?;
            assert_eq!(split_mints, whole_mints);
            assert_eq!(split, whole);
        }
        Ok(())
    }

    #[test]
    fn impulse_echoes_stay_within_delay_range() -> Result<(), Error> {
        const SAMPLE_RATE: u32 = 48000;
        let config = ParticleReverbConfig {
            poly: 64,
            ..Default::default()
        };
        let mut reverb = ParticleReverb::with_seed(config.clone(), SAMPLE_RATE, 11)?;
        let sizes = *reverb.sample_sizes();

        let impulse_frame = 75000;
        let total_frames = impulse_frame + sizes.delay_max + 1000;
        let mut input = vec![0.0; total_frames * 2];
        input[impulse_frame * 2] = 1.0;
        input[impulse_frame * 2 + 1] = 1.0;

        let output = process_in_blocks(&mut reverb, &input, 128);
        let min_delay = (sizes.delay_max as f64 * config.delay_min_rate as f64).floor() as usize;
        let max_delay = (sizes.delay_max as f64
            * (config.delay_min_rate + config.delay_range) as f64)
            .floor() as usize;
        let peak = config.poly as f32 * (config.volume_min_rate + config.volume_range);
        for (index, frame) in output.as_frames::<2>().iter().enumerate() {
            if frame[0] != 0.0 || frame[1] != 0.0 {
                assert!(index >= impulse_frame + min_delay);
                assert!(index <= impulse_frame + max_delay);
                assert!(frame[0].abs() <= peak);
            }
        }
        Ok(())
    }

    #[test]
    fn reset_restarts_warm_up() -> Result<(), Error> {
        let mut reverb = ParticleReverb::with_seed(small_config(), SMALL_SAMPLE_RATE, 12)?;
        process_in_blocks(&mut reverb, &noise(13, 800), 10);
        assert!(reverb.pool().active_count() > 0);
        reverb.reset();
        assert_eq!(reverb.frame_counter(), 0);
        assert_eq!(reverb.block_counter(), 0);
        assert_eq!(reverb.pool().active_count(), 0);
        assert!(!reverb.is_warmed_up());
        let output = process_in_blocks(&mut reverb, &noise(14, 100), 10);
        assert!(is_silent(&output));
        Ok(())
    }

    #[test]
    fn tail_frames() -> Result<(), Error> {
        let reverb = ParticleReverb::with_seed(small_config(), SMALL_SAMPLE_RATE, 0)?;
        assert_eq!(reverb.tail_frames(), 1200);
        let reverb = ParticleReverb::with_seed(ParticleReverbConfig::default(), 48000, 0)?;
        assert_eq!(reverb.tail_frames(), 182400);
        Ok(())
    }

    #[test]
    fn effect_initialization() {
        let mut effect = ParticleReverbEffect::new().with_seed(1);
        assert_eq!(effect.name(), ParticleReverbEffect::EFFECT_NAME);
        assert_eq!(effect.parameters().len(), 13);
        assert_eq!(effect.process_tail(), Some(0));
        assert!(effect.initialize(48000, 2, 1024).is_ok());
        assert!(effect.reverb().is_some());
        assert_eq!(effect.process_tail(), Some(182400));

        let mut invalid = ParticleReverbEffect::with_config(ParticleReverbConfig {
            delay_min_rate: 0.5,
            delay_range: 0.5,
            ..Default::default()
        });
        assert!(invalid.initialize(48000, 2, 1024).is_err());
        assert!(invalid.reverb().is_none());

        assert!(matches!(
            effect.initialize(48000, 2, 0),
            Err(Error::ParameterError(_))
        ));
        assert!(effect.reverb().is_none());
        assert!(effect.initialize(48000, 1, 0).is_err());
    }

    #[test]
    fn effect_passes_through_non_stereo() -> Result<(), Error> {
        let mut effect = ParticleReverbEffect::with_config(small_config());
        effect.initialize(SMALL_SAMPLE_RATE, 1, 256)?;
        assert!(effect.reverb().is_none());
        let input = noise(15, 300);
        let mut buffer = input.clone();
        effect.process(&mut buffer, &EffectTime::default());
        assert_eq!(buffer, input);
        Ok(())
    }

    #[test]
    fn effect_messages() -> Result<(), Error> {
        let mut effect = ParticleReverbEffect::with_config(small_config()).with_seed(16);
        effect.initialize(SMALL_SAMPLE_RATE, 2, 64)?;
        let mut buffer = noise(17, 800);
        for (index, block) in buffer.chunks_mut(64).enumerate() {
            effect.process(block, &EffectTime::new(index as u64 * 32));
        }
        assert!(effect.reverb().is_some_and(|r| r.pool().active_count() > 0));

        effect.process_message(&ParticleReverbMessage::Reset)?;
        assert!(effect.reverb().is_some_and(|r| r.frame_counter() == 0));

        struct OtherMessage;
        impl EffectMessage for OtherMessage {
            fn effect_name(&self) -> &'static str {
                "Other"
            }
            fn payload(&self) -> &dyn Any {
                self
            }
        }
        assert!(matches!(
            effect.process_message(&OtherMessage),
            Err(Error::MessageError(_))
        ));
        Ok(())
    }
}
