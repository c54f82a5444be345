//! Scenario forecasts built from a linear trend plus event effects.

mod forecaster;
mod pool;
mod scenario;

pub use forecaster::{
    AnticipatedEvent, FutureEvent, FutureEventSource, ScenarioForecaster, VALUE_CEILING, VALUE_FLOOR,
};
pub use pool::{forecast_indicators, IndicatorOutcome};
pub use scenario::{Scenario, ScenarioProfile, ScenarioProfiles};

use serde::{Deserialize, Serialize};

use crate::indicator::IndicatorCode;
use crate::trend::TrendFit;

/// One forecast year of one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Forecast year.
    pub year: i32,
    /// Trend plus events, clamped to [0, 100].
    pub point_estimate: f64,
    /// Lower interval bound, clamped to [0, 100].
    pub lower_bound: f64,
    /// Upper interval bound, clamped to [0, 100].
    pub upper_bound: f64,
    /// Unadjusted trend value for the year.
    pub baseline_component: f64,
    /// Sum of scaled future events landing in the year.
    pub event_component: f64,
}

/// A full scenario path for one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioForecast {
    /// Indicator forecast.
    pub indicator_code: IndicatorCode,
    /// Scenario this path belongs to.
    pub scenario: Scenario,
    /// Anchor year of the trend.
    pub last_observed_year: i32,
    /// Value observed in the anchor year.
    pub last_observed_value: f64,
    /// Residual std error times the scenario's CI multiplier.
    pub half_width: f64,
    /// One point per forecast year, ascending.
    pub points: Vec<ForecastPoint>,
    /// Future events after scenario scaling.
    pub future_events: Vec<FutureEvent>,
}

impl ScenarioForecast {
    /// Point for `year`, if inside the window.
    #[must_use]
    pub fn point(&self, year: i32) -> Option<&ForecastPoint> {
        self.points.iter().find(|p| p.year == year)
    }
}

/// Every scenario for one indicator, sharing one trend fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorForecast {
    /// Indicator forecast.
    pub indicator_code: IndicatorCode,
    /// Trend fit shared by every scenario.
    pub trend: TrendFit,
    /// Optimistic, base and pessimistic paths.
    pub scenarios: Vec<ScenarioForecast>,
}

impl IndicatorForecast {
    /// Path for one scenario.
    #[must_use]
    pub fn scenario(&self, scenario: Scenario) -> Option<&ScenarioForecast> {
        self.scenarios.iter().find(|s| s.scenario == scenario)
    }

    /// Flattens into table rows, scenario-major then year.
    #[must_use]
    pub fn rows(&self) -> Vec<ForecastRow> {
        self.scenarios
            .iter()
            .flat_map(|s| {
                s.points.iter().map(move |p| ForecastRow {
                    indicator: self.indicator_code.clone(),
                    scenario: s.scenario,
                    year: p.year,
                    forecast: p.point_estimate,
                    lower_bound: p.lower_bound,
                    upper_bound: p.upper_bound,
                    event_impact: p.event_component,
                })
            })
            .collect()
    }
}

/// Flat forecast table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    /// Indicator code.
    pub indicator: IndicatorCode,
    /// Scenario.
    pub scenario: Scenario,
    /// Forecast year.
    pub year: i32,
    /// Point estimate.
    pub forecast: f64,
    /// Lower bound.
    pub lower_bound: f64,
    /// Upper bound.
    pub upper_bound: f64,
    /// Scaled event contribution included in `forecast`.
    pub event_impact: f64,
}
