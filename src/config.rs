//! Pipeline configuration.
//!
//! Every tunable constant lives here with its reference default. A config
//! file only needs the keys it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FiError, FiResult};
use crate::forecast::{AnticipatedEvent, ScenarioProfiles};
use crate::indicator::IndicatorCode;
use crate::time::{YearRange, DAYS_PER_MONTH};

/// Scaling applied to comparable-country evidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Multiplier on comparable magnitudes for transferability.
    pub comparable_magnitude_scale: f64,
    /// Multiplier on comparable confidence.
    pub comparable_confidence_scale: f64,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            comparable_magnitude_scale: 0.7,
            comparable_confidence_scale: 0.9,
        }
    }
}

/// Time adjustment used when rolling impacts up to a date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Hyperbolic discount per month until an impact materializes.
    pub monthly_discount_rate: f64,
    /// Length of a month for fractional remainders.
    pub days_per_month: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            monthly_discount_rate: 0.05,
            days_per_month: DAYS_PER_MONTH,
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
// Plain values come before tables so the struct serializes to valid TOML.
pub struct PipelineConfig {
    /// Indicators to forecast; empty means every observed indicator.
    pub indicators: Vec<IndicatorCode>,
    /// Threads used for per-indicator forecasting.
    pub forecast_workers: usize,
    /// Years the trend is fitted on.
    pub history: YearRange,
    /// Years forecast.
    pub forecast_window: YearRange,
    /// Comparable-evidence scaling.
    pub estimation: EstimationConfig,
    /// Time discounting for the roll-up.
    pub aggregation: AggregationConfig,
    /// Multipliers per scenario.
    pub scenarios: ScenarioProfiles,
    /// Expected events added on top of the trend.
    pub anticipated_events: Vec<AnticipatedEvent>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            indicators: ["ACC_OWNERSHIP", "ACC_MM_ACCOUNT", "USG_DIGITAL_PAYMENT"]
                .into_iter()
                .filter_map(|c| IndicatorCode::new(c).ok())
                .collect(),
            forecast_workers: 1,
            history: YearRange { start: 2011, end: 2024 },
            forecast_window: YearRange { start: 2025, end: 2027 },
            estimation: EstimationConfig::default(),
            aggregation: AggregationConfig::default(),
            scenarios: ScenarioProfiles::default(),
            anticipated_events: AnticipatedEvent::defaults(),
        }
    }
}

fn non_negative(field: &str, value: f64) -> FiResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FiError::config(format!("{field} must be finite and non-negative, got {value}")))
    }
}

impl PipelineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `FiError::Toml` on syntax or type errors and `FiError::Config`
    /// if the values are inconsistent.
    pub fn from_toml_str(text: &str) -> FiResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// As [`Self::from_toml_str`], plus `FiError::Io` if the file cannot be read.
    pub fn from_toml_file(path: impl AsRef<Path>) -> FiResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks the configuration for values the pipeline cannot use.
    ///
    /// # Errors
    ///
    /// Returns `FiError::Config` describing the first problem found.
    pub fn validate(&self) -> FiResult<()> {
        if self.history.start > self.history.end {
            return Err(FiError::config(format!(
                "history start {} is after end {}",
                self.history.start, self.history.end
            )));
        }
        if self.forecast_window.start > self.forecast_window.end {
            return Err(FiError::config(format!(
                "forecast_window start {} is after end {}",
                self.forecast_window.start, self.forecast_window.end
            )));
        }
        if self.forecast_window.start <= self.history.end {
            return Err(FiError::config(format!(
                "forecast_window {} must start after history end {}",
                self.forecast_window, self.history.end
            )));
        }

        non_negative("estimation.comparable_magnitude_scale", self.estimation.comparable_magnitude_scale)?;
        non_negative("estimation.comparable_confidence_scale", self.estimation.comparable_confidence_scale)?;
        non_negative("aggregation.monthly_discount_rate", self.aggregation.monthly_discount_rate)?;
        if !(self.aggregation.days_per_month.is_finite() && self.aggregation.days_per_month > 0.0) {
            return Err(FiError::config(format!(
                "aggregation.days_per_month must be positive, got {}",
                self.aggregation.days_per_month
            )));
        }
        self.scenarios.validate().map_err(|e| FiError::config(e.to_string()))?;

        if let Some(event) = self.anticipated_events.iter().find(|e| !e.magnitude_pp.is_finite()) {
            return Err(FiError::config(format!(
                "anticipated event '{}' has non-finite magnitude_pp",
                event.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history.len(), 14);
        assert_eq!(config.forecast_window.years().collect::<Vec<_>>(), vec![2025, 2026, 2027]);
        assert_eq!(config.indicators.len(), 3);
        assert_eq!(config.anticipated_events.len(), 3);
        assert_eq!(config.forecast_workers, 1);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = PipelineConfig::from_toml_str(
            r#"
            forecast_workers = 4
            indicators = ["USG_DIGITAL_PAYMENT"]

            [forecast_window]
            start = 2025
            end = 2030

            [aggregation]
            monthly_discount_rate = 0.1

            [scenarios.base]
            event_multiplier = 1.0
            growth_multiplier = 1.1
            ci_multiplier = 1.5
            "#,
        )
        .unwrap();
        assert_eq!(config.forecast_workers, 4);
        assert_eq!(config.forecast_window.len(), 6);
        assert_eq!(config.aggregation.monthly_discount_rate, 0.1);
        assert_eq!(config.aggregation.days_per_month, 30.0);
        assert_eq!(config.scenarios.base.growth_multiplier, 1.1);
        assert_eq!(config.scenarios.pessimistic.ci_multiplier, 2.0);
        assert_eq!(config.estimation, EstimationConfig::default());
        assert_eq!(config.indicators[0].as_str(), "USG_DIGITAL_PAYMENT");
    }

    #[test]
    fn test_anticipated_events_from_toml() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [[anticipated_events]]
            name = "Interoperability mandate"
            year = 2026
            category = "policy"
            magnitude_pp = 2.5
            indicators = ["USG_DIGITAL_PAYMENT"]
            "#,
        )
        .unwrap();
        assert_eq!(config.anticipated_events.len(), 1);
        assert_eq!(config.anticipated_events[0].magnitude_pp, 2.5);
    }

    #[test]
    fn test_window_overlapping_history_rejected() {
        let err = PipelineConfig::from_toml_str(
            r#"
            [forecast_window]
            start = 2024
            end = 2026
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, FiError::Config { .. }));
    }

    #[test]
    fn test_bad_values_rejected() {
        let mut config = PipelineConfig::default();
        config.scenarios.optimistic.ci_multiplier = -0.5;
        assert!(matches!(config.validate(), Err(FiError::Config { .. })));

        let mut config = PipelineConfig::default();
        config.aggregation.days_per_month = 0.0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.history = YearRange { start: 2024, end: 2011 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_indicator_code_in_toml() {
        let err = PipelineConfig::from_toml_str(r#"indicators = ["ownership"]"#).unwrap_err();
        assert!(matches!(err, FiError::Toml(_)));
    }
}
