//! Precomputed grain window shapes.

use std::f64::consts::PI;

// -------------------------------------------------------------------------------------------------

/// A precomputed, immutable table of asymmetric grain window shapes.
///
/// Each shape is a raised-cosine attack, a flat sustain and a raised-cosine release which mirrors
/// the attack, scaled by an amplitude factor. With increasing shape index, the attack and release
/// get wider and the amplitude gets smaller: higher shapes sound quieter and softer. Particles
/// pick their shape in reverse order of shortness, so the longest particles use the highest
/// shapes (see [`ParticleDraw`](crate::effects::ParticleDraw)).
///
/// Shape `c` of a table with `S` samples and `C` shapes uses:
/// - attack width `max(c * S / (2 * C), 1)` samples
/// - amplitude `1 - 0.6 * (c / (C - 1))^0.2`
///
/// The first and last sample of every shape are exactly 0.
#[derive(Debug, Clone)]
pub struct WindowTable {
    window_size: usize,
    shape_count: usize,
    // shape major: all samples of shape 0, then shape 1, ...
    table: Box<[f32]>,
}

impl WindowTable {
    /// Create a new window table with `window_size` samples per shape and `shape_count` shapes.
    ///
    /// Panics when `window_size` is smaller than 2 or `shape_count` is smaller than 2: sizes are
    /// validated by the owning effect's config.
    pub fn new(window_size: usize, shape_count: usize) -> Self {
        assert!(window_size >= 2, "Window size must be >= 2");
        assert!(shape_count >= 2, "Window shape count must be >= 2");

        let mut table = vec![0.0; window_size * shape_count].into_boxed_slice();
        for (shape, samples) in table.chunks_exact_mut(window_size).enumerate() {
            let attack_width = Self::calc_attack_width(window_size, shape_count, shape);
            let amplitude = Self::calc_amplitude(shape_count, shape);
            let last = window_size - 1;
            for (j, sample) in samples.iter_mut().enumerate() {
                // release mirrors the attack
                let distance_to_edge = j.min(last - j) as f64;
                let ramp = if distance_to_edge < attack_width {
                    0.5 - 0.5 * (PI * distance_to_edge / attack_width).cos()
                } else {
                    1.0
                };
                *sample = (ramp * amplitude) as f32;
            }
        }

        Self {
            window_size,
            shape_count,
            table,
        }
    }

    /// Number of samples in each window shape.
    #[inline]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Number of window shapes.
    #[inline]
    pub fn shape_count(&self) -> usize {
        self.shape_count
    }

    /// Width of the raised-cosine attack (and release) of the given shape in samples.
    pub fn attack_width(&self, shape: usize) -> f64 {
        Self::calc_attack_width(self.window_size, self.shape_count, shape)
    }

    /// Peak amplitude of the given shape.
    pub fn amplitude(&self, shape: usize) -> f32 {
        Self::calc_amplitude(self.shape_count, shape) as f32
    }

    /// Look up the window value at the given phase sample in range `[0, window_size)` for the
    /// given shape in range `[0, shape_count)`.
    #[inline]
    pub fn lookup(&self, phase: usize, shape: usize) -> f32 {
        debug_assert!(phase < self.window_size, "Window phase out of bounds");
        debug_assert!(shape < self.shape_count, "Window shape out of bounds");
        self.table[shape * self.window_size + phase]
    }

    /// Access all samples of a single window shape.
    #[inline]
    pub fn shape(&self, shape: usize) -> &[f32] {
        let start = shape * self.window_size;
        &self.table[start..start + self.window_size]
    }

    fn calc_attack_width(window_size: usize, shape_count: usize, shape: usize) -> f64 {
        (shape as f64 * window_size as f64 / (2 * shape_count) as f64).max(1.0)
    }

    fn calc_amplitude(shape_count: usize, shape: usize) -> f64 {
        1.0 - 0.6 * (shape as f64 / (shape_count - 1) as f64).powf(0.2)
    }
}

// -------------------------------------------------------------------------------------------------
