use std::ops::RangeInclusive;

use four_cc::FourCC;

use super::{Parameter, ParameterType};
use crate::Error;

// -------------------------------------------------------------------------------------------------

/// A discrete (integer) parameter descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerParameter {
    id: FourCC,
    name: &'static str,
    range: RangeInclusive<i32>,
    default: i32,
}

impl IntegerParameter {
    pub const fn new(
        id: FourCC,
        name: &'static str,
        range: RangeInclusive<i32>,
        default: i32,
    ) -> Self {
        assert!(
            default >= *range.start() && default <= *range.end(),
            "Invalid parameter default value"
        );
        Self {
            id,
            name,
            range,
            default,
        }
    }

    pub fn range(&self) -> &RangeInclusive<i32> {
        &self.range
    }

    pub fn default_value(&self) -> i32 {
        self.default
    }

    pub fn clamp_value(&self, value: i32) -> i32 {
        value.clamp(*self.range.start(), *self.range.end())
    }

    pub fn normalize_value(&self, value: i32) -> f32 {
        (value as f32 - *self.range.start() as f32)
            / (*self.range.end() as f32 - *self.range.start() as f32)
    }

    pub fn denormalize_value(&self, normalized: f32) -> i32 {
        assert!((0.0..=1.0).contains(&normalized));
        let value = *self.range.start() as f32
            + normalized * (*self.range.end() as f32 - *self.range.start() as f32);
        value.round() as i32
    }

    /// Check that the given count lies within the parameter's range.
    pub fn validate_value(&self, value: usize) -> Result<usize, Error> {
        match i32::try_from(value) {
            Ok(v) if self.range.contains(&v) => Ok(value),
            _ => Err(Error::ParameterError(format!(
                "'{}' must be in range {:?}, but is {}",
                self.name, self.range, value
            ))),
        }
    }
}

impl Parameter for IntegerParameter {
    fn id(&self) -> FourCC {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn parameter_type(&self) -> ParameterType {
        ParameterType::Integer {
            range: self.range.clone(),
            default: self.default,
        }
    }

    fn default_normalized_value(&self) -> f32 {
        self.normalize_value(self.default)
    }

    fn normalized_value_to_string(&self, normalized: f32, _include_unit: bool) -> String {
        self.denormalize_value(normalized.clamp(0.0, 1.0))
            .to_string()
    }

    fn string_to_normalized_value(&self, string: String) -> Option<f32> {
        let value = string.trim().parse::<i32>().ok()?;
        Some(self.normalize_value(self.clamp_value(value)))
    }
}
