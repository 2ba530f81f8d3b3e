//! Random sources for the per-block particle draws.

use rand::{rngs::SmallRng, Rng};

// -------------------------------------------------------------------------------------------------

/// Source of uniform random values for the particle draws.
///
/// Called from the real-time thread: implementations must not block or allocate.
pub trait GrainRandom: Send + Sync + 'static {
    /// Next uniformly distributed value in range `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

impl GrainRandom for SmallRng {
    #[inline]
    fn next_unit(&mut self) -> f64 {
        self.random::<f64>()
    }
}

// -------------------------------------------------------------------------------------------------

/// A [`GrainRandom`] which endlessly cycles through a fixed sequence of values.
///
/// Makes particle draws fully predictable, e.g. for tests or offline renderings which need
/// bit-identical results.
#[derive(Debug, Clone)]
pub struct FixedSequenceRandom {
    values: Box<[f64]>,
    position: usize,
}

impl FixedSequenceRandom {
    /// Create a new sequence from the given values. Values get clamped into range `[0, 1)`.
    ///
    /// Panics when `values` is empty.
    pub fn new<V: Into<Vec<f64>>>(values: V) -> Self {
        let values = values
            .into()
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
            .collect::<Box<[_]>>();
        assert!(!values.is_empty(), "Need at least one random value");
        Self {
            values,
            position: 0,
        }
    }

    /// Create a sequence which always returns the given value.
    pub fn constant(value: f64) -> Self {
        Self::new([value])
    }
}

impl GrainRandom for FixedSequenceRandom {
    #[inline]
    fn next_unit(&mut self) -> f64 {
        let value = self.values[self.position];
        self.position = (self.position + 1) % self.values.len();
        value
    }
}

// -------------------------------------------------------------------------------------------------
