//! Construction-time configuration of the particle reverb.

use four_cc::FourCC;

use crate::{
    parameter::{FloatParameter, IntegerParameter},
    Error, Parameter,
};

// -------------------------------------------------------------------------------------------------

/// Configuration of a [`ParticleReverb`](super::ParticleReverb).
///
/// All values are fixed for the lifetime of the processor. Second-denominated values are
/// converted to sample frames with the host's sample rate when the processor gets created.
///
/// Each field has a parameter descriptor constant, which defines its valid range and default.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleReverbConfig {
    /// Number of samples per window shape.
    pub window_size: usize,
    /// Number of window shapes.
    pub window_shapes: usize,
    /// Maximum number of particles in flight.
    pub poly: usize,
    /// Render quantum in sample frames. One particle gets minted per quantum.
    pub block_size: usize,
    /// Length of the capture history in seconds.
    pub capture_sec: f32,
    /// Maximum particle length in seconds.
    pub length_max_sec: f32,
    /// Minimum particle length, relative to `length_max_sec`.
    pub length_min_rate: f32,
    /// Random particle length range, relative to `length_max_sec`.
    pub length_range: f32,
    /// Maximum particle delay in seconds.
    pub delay_max_sec: f32,
    /// Minimum particle delay, relative to `delay_max_sec`.
    pub delay_min_rate: f32,
    /// Random particle delay range, relative to `delay_max_sec`.
    pub delay_range: f32,
    /// Minimum particle volume.
    pub volume_min_rate: f32,
    /// Random particle volume range.
    pub volume_range: f32,
}

impl ParticleReverbConfig {
    pub const WINDOW_SIZE: IntegerParameter =
        IntegerParameter::new(FourCC(*b"wnsz"), "Window Size", 16..=65536, 1024);
    pub const WINDOW_SHAPES: IntegerParameter =
        IntegerParameter::new(FourCC(*b"wnch"), "Window Shapes", 2..=1024, 128);
    pub const POLY: IntegerParameter =
        IntegerParameter::new(FourCC(*b"poly"), "Polyphony", 1..=4096, 675);
    pub const BLOCK_SIZE: IntegerParameter =
        IntegerParameter::new(FourCC(*b"blck"), "Block Size", 1..=8192, 128);

    pub const CAPTURE_SEC: FloatParameter =
        FloatParameter::new(FourCC(*b"capt"), "Capture Length", 0.01..=10.0, 2.0)
            .with_unit("s");

    pub const LENGTH_MAX_SEC: FloatParameter =
        FloatParameter::new(FourCC(*b"lmax"), "Length Max", 0.001..=10.0, 1.5).with_unit("s");
    pub const LENGTH_MIN_RATE: FloatParameter =
        FloatParameter::new(FourCC(*b"lmin"), "Length Min", 0.0..=1.0, 0.8);
    pub const LENGTH_RANGE: FloatParameter =
        FloatParameter::new(FourCC(*b"lrng"), "Length Range", 0.0..=1.0, 0.175);

    pub const DELAY_MAX_SEC: FloatParameter =
        FloatParameter::new(FourCC(*b"dmax"), "Delay Max", 0.0..=10.0, 0.8).with_unit("s");
    pub const DELAY_MIN_RATE: FloatParameter =
        FloatParameter::new(FourCC(*b"dmin"), "Delay Min", 0.0..=1.0, 0.2);
    pub const DELAY_RANGE: FloatParameter =
        FloatParameter::new(FourCC(*b"drng"), "Delay Range", 0.0..=1.0, 0.75);

    pub const VOLUME_MIN_RATE: FloatParameter =
        FloatParameter::new(FourCC(*b"vmin"), "Volume Min", 0.0..=1.0, 0.7);
    pub const VOLUME_RANGE: FloatParameter =
        FloatParameter::new(FourCC(*b"vrng"), "Volume Range", 0.0..=1.0, 0.25);

    /// Descriptors of all configuration parameters.
    pub fn parameters() -> Vec<&'static dyn Parameter> {
        vec![
            &Self::WINDOW_SIZE as &'static dyn Parameter,
            &Self::WINDOW_SHAPES,
            &Self::POLY,
            &Self::BLOCK_SIZE,
            &Self::CAPTURE_SEC,
            &Self::LENGTH_MAX_SEC,
            &Self::LENGTH_MIN_RATE,
            &Self::LENGTH_RANGE,
            &Self::DELAY_MAX_SEC,
            &Self::DELAY_MIN_RATE,
            &Self::DELAY_RANGE,
            &Self::VOLUME_MIN_RATE,
            &Self::VOLUME_RANGE,
        ]
    }

    /// Check all values against their descriptor ranges and cross-parameter constraints.
    pub fn validate(&self, sample_rate: u32) -> Result<(), Error> {
        if sample_rate == 0 {
            return Err(Error::ParameterError(
                "Sample rate must be > 0".to_string(),
            ));
        }

        Self::WINDOW_SIZE.validate_value(self.window_size)?;
        Self::WINDOW_SHAPES.validate_value(self.window_shapes)?;
        Self::POLY.validate_value(self.poly)?;
        Self::BLOCK_SIZE.validate_value(self.block_size)?;
        Self::CAPTURE_SEC.validate_value(self.capture_sec)?;
        Self::LENGTH_MAX_SEC.validate_value(self.length_max_sec)?;
        Self::LENGTH_MIN_RATE.validate_value(self.length_min_rate)?;
        Self::LENGTH_RANGE.validate_value(self.length_range)?;
        Self::DELAY_MAX_SEC.validate_value(self.delay_max_sec)?;
        Self::DELAY_MIN_RATE.validate_value(self.delay_min_rate)?;
        Self::DELAY_RANGE.validate_value(self.delay_range)?;
        Self::VOLUME_MIN_RATE.validate_value(self.volume_min_rate)?;
        Self::VOLUME_RANGE.validate_value(self.volume_range)?;

        if self.length_min_rate + self.length_range >= 1.0 {
            return Err(Error::ParameterError(format!(
                "Length min rate + length range must be < 1, but is {}",
                self.length_min_rate + self.length_range
            )));
        }
        if self.delay_min_rate + self.delay_range >= 1.0 {
            return Err(Error::ParameterError(format!(
                "Delay min rate + delay range must be < 1, but is {}",
                self.delay_min_rate + self.delay_range
            )));
        }

        let sizes = self.sample_sizes(sample_rate);
        if sizes.length_max < 1 {
            return Err(Error::ParameterError(format!(
                "Length max of {}s is shorter than a single sample frame",
                self.length_max_sec
            )));
        }
        if sizes.delay_max + self.block_size > sizes.capture_len {
            return Err(Error::ParameterError(format!(
                "Delay max of {}s plus one block exceeds the capture length of {}s",
                self.delay_max_sec, self.capture_sec
            )));
        }
        Ok(())
    }

    /// Second-denominated values converted to sample frames at the given sample rate.
    pub fn sample_sizes(&self, sample_rate: u32) -> SampleSizes {
        let to_frames = |seconds: f32| (seconds as f64 * sample_rate as f64).floor() as usize;
        SampleSizes {
            capture_len: to_frames(self.capture_sec),
            length_max: to_frames(self.length_max_sec),
            delay_max: to_frames(self.delay_max_sec),
        }
    }
}

impl Default for ParticleReverbConfig {
    fn default() -> Self {
        Self {
            window_size: Self::WINDOW_SIZE.default_value() as usize,
            window_shapes: Self::WINDOW_SHAPES.default_value() as usize,
            poly: Self::POLY.default_value() as usize,
            block_size: Self::BLOCK_SIZE.default_value() as usize,
            capture_sec: Self::CAPTURE_SEC.default_value(),
            length_max_sec: Self::LENGTH_MAX_SEC.default_value(),
            length_min_rate: Self::LENGTH_MIN_RATE.default_value(),
            length_range: Self::LENGTH_RANGE.default_value(),
            delay_max_sec: Self::DELAY_MAX_SEC.default_value(),
            delay_min_rate: Self::DELAY_MIN_RATE.default_value(),
            delay_range: Self::DELAY_RANGE.default_value(),
            volume_min_rate: Self::VOLUME_MIN_RATE.default_value(),
            volume_range: Self::VOLUME_RANGE.default_value(),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Time values of a [`ParticleReverbConfig`] in sample frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSizes {
    /// Capture history length.
    pub capture_len: usize,
    /// Maximum particle length. Also the warm-up period before the first mint.
    pub length_max: usize,
    /// Maximum particle delay.
    pub delay_max: usize,
}

// -------------------------------------------------------------------------------------------------
