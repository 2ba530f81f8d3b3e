//! Effect parameter descriptors.

use std::{fmt::Debug, ops::RangeInclusive};

use four_cc::FourCC;

// -------------------------------------------------------------------------------------------------

/// Describes the type of a [`Parameter`] to e.g. select a proper visual representation in a UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterType {
    /// A continuous floating-point value.
    Float {
        range: RangeInclusive<f32>,
        default: f32,
    },
    /// A discrete integer value.
    Integer {
        range: RangeInclusive<i32>,
        default: i32,
    },
}

// -------------------------------------------------------------------------------------------------

/// Describes a single parameter of an [`Effect`](crate::Effect) for use in UIs or hosts.
///
/// Particle reverb parameters are construction-time parameters: they configure the effect before
/// it gets initialized and can't be changed afterwards.
pub trait Parameter: Debug {
    /// The unique id of the parameter.
    fn id(&self) -> FourCC;

    /// The name of the parameter.
    fn name(&self) -> &'static str;

    /// The parameter type.
    fn parameter_type(&self) -> ParameterType;

    /// Default value of parameter, expressed as normalized floating point value in range \[0,1\].
    fn default_normalized_value(&self) -> f32;

    /// Convert the given normalized floating point value to a string value.
    fn normalized_value_to_string(&self, normalized: f32, include_unit: bool) -> String;

    /// Convert the given string value to a normalized floating point value.
    /// Returns `None` when conversion failed, else a valid normalized value.
    fn string_to_normalized_value(&self, string: String) -> Option<f32>;
}

// -------------------------------------------------------------------------------------------------

mod float;
pub use float::FloatParameter;

mod integer;
pub use integer::IntegerParameter;
