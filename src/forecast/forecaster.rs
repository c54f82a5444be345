use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::FiResult;
use crate::forecast::scenario::{Scenario, ScenarioProfiles};
use crate::forecast::{ForecastPoint, IndicatorForecast, ScenarioForecast};
use crate::impact::EventImpact;
use crate::indicator::IndicatorCode;
use crate::record::{EventCategory, Observation};
use crate::time::YearRange;
use crate::trend::{TrendEstimator, TrendFit};

/// Lowest value an indicator (a percentage) can take.
pub const VALUE_FLOOR: f64 = 0.0;

/// Highest value an indicator (a percentage) can take.
pub const VALUE_CEILING: f64 = 100.0;

/// An externally anticipated future event, not present in the event table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnticipatedEvent {
    /// Display name.
    pub name: String,
    /// Year the boost lands in.
    pub year: i32,
    /// Event category, for reporting.
    pub category: EventCategory,
    /// Boost in percentage points in `year`, before scenario scaling.
    pub magnitude_pp: f64,
    /// Indicators this event affects; empty means all.
    #[serde(default)]
    pub indicators: Vec<IndicatorCode>,
}

impl AnticipatedEvent {
    /// True if the event affects `indicator`.
    #[must_use]
    pub fn applies_to(&self, indicator: &IndicatorCode) -> bool {
        self.indicators.is_empty() || self.indicators.contains(indicator)
    }

    /// CBDC pilot, policy 2.0 and 5G phase 2.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                name: "CBDC Pilot Launch".to_string(),
                year: 2025,
                category: EventCategory::ProductLaunch,
                magnitude_pp: 1.5,
                indicators: Vec::new(),
            },
            Self {
                name: "Financial Inclusion Policy 2.0".to_string(),
                year: 2026,
                category: EventCategory::Policy,
                magnitude_pp: 2.0,
                indicators: Vec::new(),
            },
            Self {
                name: "5G Expansion Phase 2".to_string(),
                year: 2027,
                category: EventCategory::Infrastructure,
                magnitude_pp: 1.0,
                indicators: Vec::new(),
            },
        ]
    }
}

/// Where a future event contribution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FutureEventSource {
    /// From the configured anticipated events.
    Anticipated,
    /// From an estimated impact of a recorded event.
    Recorded,
}

/// A future event contribution landing in one forecast year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureEvent {
    /// Event name.
    pub name: String,
    /// Forecast year the contribution lands in.
    pub year: i32,
    /// Signed percentage points.
    pub magnitude: f64,
    /// Anticipated or recorded.
    pub source: FutureEventSource,
}

/// Trend-plus-events forecaster for the three scenarios.
#[derive(Debug, Clone)]
pub struct ScenarioForecaster {
    trend: TrendEstimator,
    window: YearRange,
    profiles: ScenarioProfiles,
    anticipated: Vec<AnticipatedEvent>,
}

impl ScenarioForecaster {
    /// Creates a forecaster over `window`, fitting trends with `trend`.
    #[must_use]
    pub fn new(
        trend: TrendEstimator,
        window: YearRange,
        profiles: ScenarioProfiles,
        anticipated: Vec<AnticipatedEvent>,
    ) -> Self {
        Self {
            trend,
            window,
            profiles,
            anticipated,
        }
    }

    /// Builds a forecaster from the pipeline settings.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            TrendEstimator::new(config.history),
            config.forecast_window,
            config.scenarios,
            config.anticipated_events.clone(),
        )
    }

    /// Years forecast.
    #[must_use]
    pub const fn window(&self) -> YearRange {
        self.window
    }

    /// Trend estimator used for every scenario.
    #[must_use]
    pub const fn trend_estimator(&self) -> &TrendEstimator {
        &self.trend
    }

    /// Unscaled future contributions for `indicator`: anticipated events
    /// plus recorded impacts whose event year falls in the window.
    #[must_use]
    pub fn future_events(&self, indicator: &IndicatorCode, impacts: &[EventImpact]) -> Vec<FutureEvent> {
        let anticipated = self
            .anticipated
            .iter()
            .filter(|e| self.window.contains(e.year) && e.applies_to(indicator))
            .map(|e| FutureEvent {
                name: e.name.clone(),
                year: e.year,
                magnitude: e.magnitude_pp,
                source: FutureEventSource::Anticipated,
            });
        let recorded = impacts
            .iter()
            .filter(|i| &i.indicator_code == indicator && self.window.contains(i.event_year()))
            .map(|i| FutureEvent {
                name: i.event_name.clone(),
                year: i.event_year(),
                magnitude: i.signed_magnitude(),
                source: FutureEventSource::Recorded,
            });
        anticipated.chain(recorded).collect()
    }

    /// Forecasts one scenario from an existing trend fit.
    #[must_use]
    pub fn forecast_with_trend(
        &self,
        fit: &TrendFit,
        scenario: Scenario,
        future: &[FutureEvent],
    ) -> ScenarioForecast {
        let profile = self.profiles.get(scenario);
        let (last_year, last_value) = fit.last_observed();
        let anchor = fit.predict(last_year);
        let half_width = fit.residual_std_error * profile.ci_multiplier;

        let scaled: Vec<FutureEvent> = future
            .iter()
            .map(|e| FutureEvent {
                magnitude: e.magnitude * profile.event_multiplier,
                ..e.clone()
            })
            .collect();

        let points = self
            .window
            .years()
            .map(|year| {
                let baseline = fit.predict(year);
                let scenario_trend = (baseline - anchor) * profile.growth_multiplier;
                let event_component: f64 = scaled.iter().filter(|e| e.year == year).map(|e| e.magnitude).sum();
                let point = (last_value + scenario_trend + event_component).clamp(VALUE_FLOOR, VALUE_CEILING);
                ForecastPoint {
                    year,
                    point_estimate: point,
                    lower_bound: (point - half_width).clamp(VALUE_FLOOR, VALUE_CEILING),
                    upper_bound: (point + half_width).clamp(VALUE_FLOOR, VALUE_CEILING),
                    baseline_component: baseline,
                    event_component,
                }
            })
            .collect();

        ScenarioForecast {
            indicator_code: fit.indicator_code.clone(),
            scenario,
            last_observed_year: last_year,
            last_observed_value: last_value,
            half_width,
            points,
            future_events: scaled,
        }
    }

    /// Forecasts one scenario, fitting the trend first.
    ///
    /// # Errors
    ///
    /// Returns `FiError::MissingData` if the trend cannot be fitted.
    pub fn forecast(
        &self,
        indicator: &IndicatorCode,
        scenario: Scenario,
        observations: &[Observation],
        impacts: &[EventImpact],
    ) -> FiResult<ScenarioForecast> {
        let fit = self.trend.fit(indicator, observations)?;
        let future = self.future_events(indicator, impacts);
        Ok(self.forecast_with_trend(&fit, scenario, &future))
    }

    /// Forecasts every scenario from one shared trend fit.
    ///
    /// # Errors
    ///
    /// Returns `FiError::MissingData` if the trend cannot be fitted.
    pub fn forecast_all_scenarios(
        &self,
        indicator: &IndicatorCode,
        observations: &[Observation],
        impacts: &[EventImpact],
    ) -> FiResult<IndicatorForecast> {
        let fit = self.trend.fit(indicator, observations)?;
        let future = self.future_events(indicator, impacts);
        debug!(indicator = %indicator, future_events = future.len(), "forecasting scenarios");

        let scenarios = Scenario::ALL
            .into_iter()
            .map(|s| self.forecast_with_trend(&fit, s, &future))
            .collect();

        info!(indicator = %indicator, window = %self.window, "forecast complete");
        Ok(IndicatorForecast {
            indicator_code: indicator.clone(),
            trend: fit,
            scenarios,
        })
    }
}
