//! Fixed size pool of in-flight particles.

use super::{
    config::{ParticleReverbConfig, SampleSizes},
    random::GrainRandom,
};

// -------------------------------------------------------------------------------------------------

/// Random draws of a single mint. All channels of a particle share them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleDraw {
    /// Drawn length relative to the max particle length.
    pub length_fraction: f64,
    /// Particle length in frames.
    pub length: usize,
    /// Distance in frames between the write head and the particle's read position.
    pub delay: usize,
    /// Volume factor.
    pub volume: f32,
    /// Window shape index.
    pub shape: usize,
}

impl ParticleDraw {
    /// Draw length, delay and volume of a new particle, in this order, from the given random
    /// source and derive the particle's window shape from the drawn length: shorter particles
    /// use lower shapes with a sharp attack at full level, particles close to the max length use
    /// the highest shapes with broad, quieter windows.
    pub fn new<R: GrainRandom>(
        random: &mut R,
        config: &ParticleReverbConfig,
        sizes: &SampleSizes,
    ) -> Self {
        let length_fraction =
            config.length_min_rate as f64 + config.length_range as f64 * random.next_unit();
        let length = (sizes.length_max as f64 * length_fraction).floor() as usize;

        let delay_fraction =
            config.delay_min_rate as f64 + config.delay_range as f64 * random.next_unit();
        let delay = (sizes.delay_max as f64 * delay_fraction).floor() as usize;

        let volume =
            (config.volume_min_rate as f64 + config.volume_range as f64 * random.next_unit()) as f32;

        // shape table columns run reversed: the shortest particles use shape 0
        let shape_count = config.window_shapes;
        let shortness = ((1.0 - length_fraction) * shape_count as f64).max(0.0).ceil() as usize;
        let shape = shape_count - 1 - shortness.min(shape_count - 1);

        Self {
            length_fraction,
            length,
            delay,
            volume,
            shape,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// A single windowed tap into the capture history, occupying one pool slot.
///
/// A particle plays `length` frames, reading the capture history `delay` frames behind the
/// frame that is currently being rendered. The cursor counts the frames that got played already.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Particle {
    active: bool,
    length: usize,
    delay: usize,
    volume: f32,
    shape: usize,
    cursor: usize,
}

impl Particle {
    /// Create a new inactive particle.
    pub const fn new() -> Self {
        Self {
            active: false,
            length: 0,
            delay: 0,
            volume: 0.0,
            shape: 0,
            cursor: 0,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn delay(&self) -> usize {
        self.delay
    }

    #[inline]
    pub fn volume(&self) -> f32 {
        self.volume
    }

    #[inline]
    pub fn shape(&self) -> usize {
        self.shape
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of frames left to play.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.length - self.cursor
    }

    /// Window phase sample for the given particle frame in range `[0, window_size)`.
    #[inline]
    pub fn window_phase(&self, frame: usize, window_size: usize) -> usize {
        debug_assert!(frame < self.length, "Particle frame out of bounds");
        (frame as u64 * window_size as u64 / self.length as u64) as usize
    }

    /// Replace this particle with a freshly minted one.
    fn activate(&mut self, draw: &ParticleDraw) {
        self.active = draw.length > 0;
        self.length = draw.length;
        self.delay = draw.delay;
        self.volume = draw.volume;
        self.shape = draw.shape;
        self.cursor = 0;
    }

    /// Move the cursor forward by at most `frames` and return the number of frames consumed.
    /// Retires the particle when it reached its end.
    #[inline]
    pub(crate) fn advance(&mut self, frames: usize) -> usize {
        let consumed = frames.min(self.remaining());
        self.cursor += consumed;
        if self.cursor == self.length {
            self.active = false;
        }
        consumed
    }

    fn retire(&mut self) {
        self.active = false;
        self.cursor = self.length;
    }
}

// -------------------------------------------------------------------------------------------------

/// Ring of `poly` particle slots.
///
/// New particles are minted into slot `mint_counter % poly`, which implicitly retires whatever
/// particle occupied the slot before, even when it did not finish playing. This bounds the
/// number of particles in flight to `poly`.
#[derive(Debug, Clone)]
pub struct ParticlePool {
    slots: Box<[Particle]>,
    mint_counter: u64,
}

impl ParticlePool {
    /// Create a new pool with `poly` inactive slots.
    pub fn new(poly: usize) -> Self {
        assert!(poly > 0, "Particle pool needs at least one slot");
        Self {
            slots: vec![Particle::new(); poly].into_boxed_slice(),
            mint_counter: 0,
        }
    }

    /// Number of slots.
    #[inline]
    pub fn poly(&self) -> usize {
        self.slots.len()
    }

    /// Number of particles minted since creation or the last [`Self::retire_all`].
    #[inline]
    pub fn mint_counter(&self) -> u64 {
        self.mint_counter
    }

    /// Number of particles which are still playing.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|p| p.is_active()).count()
    }

    /// Access all slots.
    #[inline]
    pub fn slots(&self) -> &[Particle] {
        &self.slots
    }

    #[inline]
    pub(crate) fn slots_mut(&mut self) -> &mut [Particle] {
        &mut self.slots
    }

    /// Mint a new particle into the next slot and return the slot index.
    pub fn mint(&mut self, draw: &ParticleDraw) -> usize {
        let slot = (self.mint_counter % self.slots.len() as u64) as usize;
        self.slots[slot].activate(draw);
        self.mint_counter += 1;
        slot
    }

    /// Retire all particles and reset the mint counter.
    pub fn retire_all(&mut self) {
        for particle in self.slots.iter_mut() {
            particle.retire();
        }
        self.mint_counter = 0;
    }
}

// -------------------------------------------------------------------------------------------------
