use std::ops::RangeInclusive;

use four_cc::FourCC;

use super::{Parameter, ParameterType};
use crate::Error;

// -------------------------------------------------------------------------------------------------

/// A continuous (float) parameter descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatParameter {
    id: FourCC,
    name: &'static str,
    range: RangeInclusive<f32>,
    default: f32,
    unit: &'static str,
}

impl FloatParameter {
    /// Create a new float parameter descriptor.
    pub const fn new(
        id: FourCC,
        name: &'static str,
        range: RangeInclusive<f32>,
        default: f32,
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
            unit: "",
        }
    }

    /// Optional unit for string displays.
    pub const fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = unit;
        self
    }

    /// The parameter's value range.
    pub fn range(&self) -> &RangeInclusive<f32> {
        &self.range
    }

    /// The parameter's default value.
    pub fn default_value(&self) -> f32 {
        self.default
    }

    /// The parameter's display unit.
    pub fn unit(&self) -> &'static str {
        self.unit
    }

    /// Clamp the given plain value to the parameter's range.
    pub fn clamp_value(&self, value: f32) -> f32 {
        value.clamp(*self.range.start(), *self.range.end())
    }

    /// Normalize the given plain value to a 0.0-1.0 range.
    pub fn normalize_value(&self, value: f32) -> f32 {
        (value - *self.range.start()) / (*self.range.end() - *self.range.start())
    }

    /// Denormalize a 0.0-1.0 ranged value to the corresponding plain value.
    pub fn denormalize_value(&self, normalized: f32) -> f32 {
        assert!((0.0..=1.0).contains(&normalized));
        *self.range.start() + normalized * (*self.range.end() - *self.range.start())
    }

    /// Check that the given plain value lies within the parameter's range.
    pub fn validate_value(&self, value: f32) -> Result<f32, Error> {
        if self.range.contains(&value) {
            Ok(value)
        } else {
            Err(Error::ParameterError(format!(
                "'{}' must be in range {:?}, but is {}",
                self.name, self.range, value
            )))
        }
    }

    /// Convert the given plain value to a string.
    pub fn value_to_string(&self, value: f32, include_unit: bool) -> String {
        if include_unit && !self.unit.is_empty() {
            format!("{:.2} {}", value, self.unit)
        } else {
            format!("{:.2}", value)
        }
    }

    /// Convert the given string to a plain, clamped value.
    pub fn string_to_value(&self, string: &str) -> Option<f32> {
        let value = string
            .trim()
            .trim_end_matches(self.unit)
            .trim()
            .parse::<f32>()
            .ok()?;
        Some(self.clamp_value(value))
    }
}

impl Parameter for FloatParameter {
    fn id(&self) -> FourCC {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn parameter_type(&self) -> ParameterType {
        ParameterType::Float {
            range: self.range.clone(),
            default: self.default,
        }
    }

    fn default_normalized_value(&self) -> f32 {
        self.normalize_value(self.default)
    }

    fn normalized_value_to_string(&self, normalized: f32, include_unit: bool) -> String {
        let value = self.denormalize_value(normalized.clamp(0.0, 1.0));
        self.value_to_string(value, include_unit)
    }

    fn string_to_normalized_value(&self, string: String) -> Option<f32> {
        let value = self.string_to_value(&string)?;
        Some(self.normalize_value(value))
    }
}

// -------------------------------------------------------------------------------------------------
