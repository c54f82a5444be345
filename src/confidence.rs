//! Evidence confidence.
//!
//! Confidence here is an analyst-assigned belief in an impact estimate,
//! distinct from the statistical interval on a forecast. It is always a
//! value in [0.0, 1.0].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Qualitative confidence levels used by some input tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// 0.8
    High,
    /// 0.6
    Medium,
    /// 0.4
    Low,
}

impl ConfidenceLevel {
    /// Numeric value a level maps to.
    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Self::High => 0.8,
            Self::Medium => 0.6,
            Self::Low => 0.4,
        }
    }
}

impl FromStr for ConfidenceLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(ValidationError::UnknownConfidenceLevel {
                value: other.to_string(),
            }),
        }
    }
}

/// Analyst-assigned confidence in an impact estimate.
///
/// # Examples
///
/// ```
/// use fi_forecast::EvidenceConfidence;
///
/// let c = EvidenceConfidence::new(0.8).unwrap();
/// assert!((c.scaled(0.9).value() - 0.72).abs() < 1e-12);
/// assert!(EvidenceConfidence::new(1.2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct EvidenceConfidence(f64);

impl EvidenceConfidence {
    /// Minimum valid confidence value.
    pub const MIN_VALUE: f64 = 0.0;

    /// Maximum valid confidence value.
    pub const MAX_VALUE: f64 = 1.0;

    /// Creates a confidence with validation.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ConfidenceOutOfRange` if the value is NaN or
    /// not in [0.0, 1.0].
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if value.is_nan() || !(Self::MIN_VALUE..=Self::MAX_VALUE).contains(&value) {
            return Err(ValidationError::ConfidenceOutOfRange { value });
        }
        Ok(Self(value))
    }

    /// Parses either a number or a qualitative level (`high|medium|low`).
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` when the text is neither.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        match text.parse::<f64>() {
            Ok(value) => Self::new(value),
            Err(_) => Ok(Self(text.parse::<ConfidenceLevel>()?.value())),
        }
    }

    /// Full certainty.
    #[must_use]
    pub const fn one() -> Self {
        Self(1.0)
    }

    /// Complete uncertainty.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0.0)
    }

    /// Returns the raw value in [0, 1].
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Multiplies by `factor`, clamping the result into range.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self((self.0 * factor).clamp(Self::MIN_VALUE, Self::MAX_VALUE))
    }

    /// At least 0.8.
    #[must_use]
    pub fn is_high(self) -> bool {
        self.0 >= 0.8
    }

    /// Below 0.5.
    #[must_use]
    pub fn is_low(self) -> bool {
        self.0 < 0.5
    }
}

impl Default for EvidenceConfidence {
    fn default() -> Self {
        Self(0.5)
    }
}

impl TryFrom<f64> for EvidenceConfidence {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EvidenceConfidence> for f64 {
    fn from(c: EvidenceConfidence) -> Self {
        c.0
    }
}

impl fmt::Display for EvidenceConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
