//! Noise level value object and the safety-tier classifier.
//!
//! `NoiseCategory::classify` is the only place a category is derived.
//! `TelemetryEvent::record` calls it, and no constructor accepts a category
//! from the outside.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Upper bound (inclusive) of the `safe` tier, in dB.
pub const SAFE_MAX_DB: f64 = 70.0;

/// Upper bound (inclusive) of the `moderate` tier, in dB.
pub const MODERATE_MAX_DB: f64 = 85.0;

/// A finite sound pressure level in decibels.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct NoiseLevel(f64);

impl NoiseLevel {
    /// Creates a NoiseLevel, rejecting NaN and infinities.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::invalid_format(
                "noiseLevel",
                "must be a finite number",
            ));
        }
        Ok(Self(value))
    }

    /// Returns the level in dB.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Wire rendering: always carries a fractional part (`90.0`, `72.5`).
    pub fn to_wire_string(&self) -> String {
        if self.0.fract() == 0.0 {
            format!("{:.1}", self.0)
        } else {
            format!("{}", self.0)
        }
    }
}

impl fmt::Display for NoiseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} dB", self.to_wire_string())
    }
}

/// Discrete hearing-safety tier derived from a noise level.
///
/// Variants are declared in order of severity, so `Ord` ranks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseCategory {
    Safe,
    Moderate,
    Harmful,
}

impl NoiseCategory {
    /// Classifies a level: `<= 70` safe, `<= 85` moderate, above that harmful.
    pub fn classify(level: NoiseLevel) -> Self {
        let db = level.value();
        if db <= SAFE_MAX_DB {
            NoiseCategory::Safe
        } else if db <= MODERATE_MAX_DB {
            NoiseCategory::Moderate
        } else {
            NoiseCategory::Harmful
        }
    }

    /// Lowercase name used on the wire and in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseCategory::Safe => "safe",
            NoiseCategory::Moderate => "moderate",
            NoiseCategory::Harmful => "harmful",
        }
    }

    /// All categories, least severe first.
    pub fn all() -> &'static [NoiseCategory] {
        &[
            NoiseCategory::Safe,
            NoiseCategory::Moderate,
            NoiseCategory::Harmful,
        ]
    }
}

impl fmt::Display for NoiseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NoiseCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "safe" => Ok(NoiseCategory::Safe),
            "moderate" => Ok(NoiseCategory::Moderate),
            "harmful" => Ok(NoiseCategory::Harmful),
            other => Err(ValidationError::invalid_format(
                "category",
                format!("unknown category '{}'", other),
            )),
        }
    }
}
