#![doc = include_str!("../README.md")]

// private mods (will be partly re-exported)
mod effect;
mod error;
mod parameter;

// public, flat re-exports
pub use error::Error;

pub use effect::{Effect, EffectMessage, EffectMessagePayload, EffectTime};

pub use parameter::{FloatParameter, IntegerParameter, Parameter, ParameterType};

// public mods
pub mod utils;

pub mod effects {
    //! Particle reverb effect and its building blocks.

    pub use super::effect::particle_reverb::{
        CaptureBuffer, FixedSequenceRandom, GrainRandom, Particle, ParticleDraw, ParticlePool,
        ParticleReverb, ParticleReverbConfig, ParticleReverbEffect, ParticleReverbMessage,
        SampleSizes,
    };
}

// -------------------------------------------------------------------------------------------------

#[cfg(all(test, debug_assertions, feature = "assert-allocs"))]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;
