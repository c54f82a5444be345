use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A forecast scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Faster growth, stronger events, narrowest interval.
    Optimistic,
    /// Trend and events as estimated.
    Base,
    /// Slower growth, weaker events, widest interval.
    Pessimistic,
}

impl Scenario {
    /// All scenarios, in reporting order.
    pub const ALL: [Self; 3] = [Self::Optimistic, Self::Base, Self::Pessimistic];

    /// Lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Optimistic => "optimistic",
            Self::Base => "base",
            Self::Pessimistic => "pessimistic",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimistic" => Ok(Self::Optimistic),
            "base" => Ok(Self::Base),
            "pessimistic" => Ok(Self::Pessimistic),
            other => Err(ValidationError::UnknownVariant {
                field: "scenario",
                value: other.to_string(),
            }),
        }
    }
}

/// Multipliers that define a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioProfile {
    /// Applied to future event magnitudes.
    pub event_multiplier: f64,
    /// Applied to trend growth since the last observation.
    pub growth_multiplier: f64,
    /// Residual standard errors in the interval half-width.
    pub ci_multiplier: f64,
}

impl ScenarioProfile {
    fn validate(&self, scenario: Scenario) -> Result<(), ValidationError> {
        for (field, value) in [
            ("event_multiplier", self.event_multiplier),
            ("growth_multiplier", self.growth_multiplier),
            ("ci_multiplier", self.ci_multiplier),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidField {
                    field: "scenarios",
                    reason: format!("{scenario}.{field} must be finite and non-negative, got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// Profiles for all three scenarios.
///
/// The downside scenario deliberately carries the widest interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioProfiles {
    /// Optimistic multipliers.
    pub optimistic: ScenarioProfile,
    /// Base multipliers.
    pub base: ScenarioProfile,
    /// Pessimistic multipliers.
    pub pessimistic: ScenarioProfile,
}

impl Default for ScenarioProfiles {
    fn default() -> Self {
        Self {
            optimistic: ScenarioProfile {
                event_multiplier: 1.3,
                growth_multiplier: 1.2,
                ci_multiplier: 1.0,
            },
            base: ScenarioProfile {
                event_multiplier: 1.0,
                growth_multiplier: 1.0,
                ci_multiplier: 1.5,
            },
            pessimistic: ScenarioProfile {
                event_multiplier: 0.7,
                growth_multiplier: 0.8,
                ci_multiplier: 2.0,
            },
        }
    }
}

impl ScenarioProfiles {
    /// Profile for one scenario.
    #[must_use]
    pub const fn get(&self, scenario: Scenario) -> &ScenarioProfile {
        match scenario {
            Scenario::Optimistic => &self.optimistic,
            Scenario::Base => &self.base,
            Scenario::Pessimistic => &self.pessimistic,
        }
    }

    /// Checks every multiplier is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidField` naming the offending value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for scenario in Scenario::ALL {
            self.get(scenario).validate(scenario)?;
        }
        Ok(())
    }
}
