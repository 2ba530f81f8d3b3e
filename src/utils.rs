//! Buffer and DSP helpers, shared by effects.

pub mod buffer;
pub mod dsp;
