//! End-to-end run: estimate, build the matrix, roll up, back-test, forecast.
//!
//! Every stage is a pure function of the dataset and config. The only
//! fallible steps are an empty input table, hashing the input and the
//! forecast pool itself; per-entity problems end up in
//! [`PipelineReport::skipped`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::dataset::{Dataset, LoadReport};
use crate::error::{FiError, FiResult, Table};
use crate::evidence::EvidenceStore;
use crate::forecast::{forecast_indicators, ForecastRow, IndicatorForecast, Scenario, ScenarioForecaster};
use crate::impact::{
    aggregate_to_date, validate_against_historical, AggregateImpact, EventImpact, ImpactEstimator, ImpactMatrix,
    ImpactMatrixBuilder, ValidationReport,
};
use crate::indicator::IndicatorCode;
use crate::skip::{SkipKind, Skipped};

/// Distance between a policy target and one scenario's forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetGap {
    /// Indicator the target is set on.
    pub indicator_code: IndicatorCode,
    /// Free-text label of the target (e.g. the strategy it comes from).
    pub label: String,
    /// Year the target should be met.
    pub target_year: i32,
    /// Target value in percent.
    pub target_value: f64,
    /// Scenario compared against.
    pub scenario: Scenario,
    /// Year compared: the target year, or the last forecast year when the
    /// target lies outside the window.
    pub forecast_year: i32,
    /// Point estimate for `forecast_year`.
    pub forecast_value: f64,
    /// `target_value - forecast_value`; positive means short of target.
    pub gap: f64,
}

impl TargetGap {
    /// True when the forecast reaches the target.
    #[must_use]
    pub fn is_met(&self) -> bool {
        self.gap <= 0.0
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Random id of this run.
    pub run_id: Uuid,
    /// Wall-clock time the report was assembled.
    pub generated_at: DateTime<Utc>,
    /// blake3 of the typed input records.
    pub input_fingerprint: String,
    /// blake3 of the rendered matrix.
    pub matrix_fingerprint: String,
    /// Date impacts were aggregated to.
    pub target_date: NaiveDate,
    /// Configuration the run used.
    pub config: PipelineConfig,
    /// Loader counts, when the input came from CSV files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<LoadReport>,
    /// Estimated impacts, direct and comparable.
    pub impacts: Vec<EventImpact>,
    /// Event-indicator association matrix.
    pub matrix: ImpactMatrix,
    /// Discounted impact per indicator as of `target_date`.
    pub aggregate: Vec<AggregateImpact>,
    /// Back-test of impacts against observations.
    pub validation: ValidationReport,
    /// Per-indicator scenario forecasts.
    pub forecasts: Vec<IndicatorForecast>,
    /// Target gaps, one per target and scenario.
    pub target_gaps: Vec<TargetGap>,
    /// Entities left out of the run, with the reason.
    pub skipped: Vec<Skipped>,
}

impl PipelineReport {
    /// Attaches the loader's report.
    #[must_use]
    pub fn with_load_report(mut self, load: LoadReport) -> Self {
        self.load = Some(load);
        self
    }

    /// All forecast rows, indicator by indicator.
    #[must_use]
    pub fn forecast_rows(&self) -> Vec<ForecastRow> {
        self.forecasts.iter().flat_map(IndicatorForecast::rows).collect()
    }

    /// Forecast for one indicator code, if it was produced.
    #[must_use]
    pub fn forecast(&self, indicator: &str) -> Option<&IndicatorForecast> {
        self.forecasts.iter().find(|f| f.indicator_code.as_str() == indicator)
    }
}

/// Runs the full pipeline for one configuration and evidence catalogue.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    evidence: EvidenceStore,
}

impl Pipeline {
    /// Creates a pipeline; the config is validated on each run.
    #[must_use]
    pub fn new(config: PipelineConfig, evidence: EvidenceStore) -> Self {
        Self { config, evidence }
    }

    /// Configuration this pipeline runs with.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Indicators this run forecasts.
    #[must_use]
    pub fn indicators(&self, dataset: &Dataset) -> Vec<IndicatorCode> {
        if self.config.indicators.is_empty() {
            dataset.observed_indicators()
        } else {
            self.config.indicators.clone()
        }
    }

    /// Runs every stage. Aggregation is as of `target_date`.
    ///
    /// # Errors
    ///
    /// Returns `FiError::Config` for an invalid configuration,
    /// `FiError::EmptyInput` when the dataset has no observations or no
    /// events, `FiError::Json` if the input cannot be fingerprinted, and pool
    /// errors from [`forecast_indicators`].
    pub fn run(&self, dataset: &Dataset, target_date: NaiveDate) -> FiResult<PipelineReport> {
        self.config.validate()?;
        if dataset.observations.is_empty() {
            return Err(FiError::EmptyInput {
                table: Table::Observations,
            });
        }
        if dataset.events.is_empty() {
            return Err(FiError::EmptyInput { table: Table::Events });
        }
        let run_id = Uuid::new_v4();
        let input_fingerprint = dataset.fingerprint()?;
        info!(%run_id, fingerprint = %input_fingerprint, %target_date, "pipeline started");

        let estimation =
            ImpactEstimator::new(&self.evidence, self.config.estimation).estimate(&dataset.events, &dataset.links);
        let mut skipped = estimation.skipped;
        let impacts = estimation.impacts;

        let matrix = ImpactMatrixBuilder::new(&self.evidence, self.config.estimation).build(
            &dataset.events,
            &dataset.links,
            &dataset.observations,
        );
        let aggregate = aggregate_to_date(&impacts, target_date, &self.config.aggregation);
        let validation = validate_against_historical(&impacts, &dataset.observations, None);

        let forecaster = ScenarioForecaster::from_config(&self.config);
        let indicators = self.indicators(dataset);
        let outcomes = forecast_indicators(
            &forecaster,
            &indicators,
            &dataset.observations,
            &impacts,
            self.config.forecast_workers,
        )?;

        let mut forecasts = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome.result {
                Ok(forecast) => forecasts.push(forecast),
                Err(err) => {
                    warn!(indicator = %outcome.indicator_code, "indicator not forecast: {err}");
                    skipped.push(Skipped::from_error(SkipKind::Indicator, outcome.indicator_code.as_str(), &err));
                }
            }
        }

        let target_gaps = self.target_gaps(dataset, &forecasts);
        info!(
            %run_id,
            impacts = impacts.len(),
            forecasts = forecasts.len(),
            target_gaps = target_gaps.len(),
            skipped = skipped.len(),
            "pipeline finished"
        );

        Ok(PipelineReport {
            run_id,
            generated_at: Utc::now(),
            input_fingerprint,
            matrix_fingerprint: matrix.fingerprint(),
            target_date,
            config: self.config.clone(),
            load: None,
            impacts,
            matrix,
            aggregate,
            validation,
            forecasts,
            target_gaps,
            skipped,
        })
    }

    fn target_gaps(&self, dataset: &Dataset, forecasts: &[IndicatorForecast]) -> Vec<TargetGap> {
        let window = self.config.forecast_window;
        let mut gaps = Vec::new();
        for target in &dataset.targets {
            let Some(forecast) = forecasts.iter().find(|f| f.indicator_code == target.indicator_code) else {
                continue;
            };
            let year = if window.contains(target.target_year) {
                target.target_year
            } else {
                window.end
            };
            for scenario in &forecast.scenarios {
                let Some(point) = scenario.point(year) else {
                    continue;
                };
                gaps.push(TargetGap {
                    indicator_code: target.indicator_code.clone(),
                    label: target.label.clone(),
                    target_year: target.target_year,
                    target_value: target.target_value,
                    scenario: scenario.scenario,
                    forecast_year: year,
                    forecast_value: point.point_estimate,
                    gap: target.target_value - point.point_estimate,
                });
            }
        }
        gaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Event, EventCategory, Observation, Target};

    fn code(s: &str) -> IndicatorCode {
        IndicatorCode::new(s).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dataset() -> Dataset {
        let observations = vec![
            Observation::new(code("ACC_OWNERSHIP"), 40.0, d(2020, 12, 31)),
            Observation::new(code("ACC_OWNERSHIP"), 48.0, d(2024, 12, 31)),
            Observation::new(code("USG_DIGITAL_PAYMENT"), 20.0, d(2024, 12, 31)),
        ];
        let events = vec![
            Event::new("EVT_1", "Launch", Some(d(2021, 5, 1)), EventCategory::ProductLaunch),
            Event::new("EVT_2", "Undated", None, EventCategory::Policy),
        ];
        let targets = vec![
            Target {
                indicator_code: code("ACC_OWNERSHIP"),
                target_value: 60.0,
                target_year: 2030,
                label: "NFIS-II".to_string(),
            },
            Target {
                indicator_code: code("USG_DIGITAL_PAYMENT"),
                target_value: 40.0,
                target_year: 2026,
                label: String::new(),
            },
        ];
        Dataset::new(observations, events, Vec::new(), targets)
    }

    fn pipeline() -> Pipeline {
        let config = PipelineConfig {
            indicators: vec![code("ACC_OWNERSHIP"), code("USG_DIGITAL_PAYMENT")],
            anticipated_events: Vec::new(),
            ..PipelineConfig::default()
        };
        Pipeline::new(config, EvidenceStore::reference())
    }

    #[test]
    fn test_run_isolates_failures() {
        let report = pipeline().run(&dataset(), d(2025, 1, 1)).unwrap();
        assert_eq!(report.forecasts.len(), 1);
        assert!(report
            .skipped
            .iter()
            .any(|s| s.kind == SkipKind::Indicator && s.id == "USG_DIGITAL_PAYMENT"));
        assert!(report.skipped.iter().any(|s| s.kind == SkipKind::Event && s.id == "EVT_2"));
        assert!(!report.impacts.is_empty());
        assert!(report.impacts.iter().all(|i| i.is_comparable()));
        assert_eq!(report.forecast_rows().len(), 9);
    }

    #[test]
    fn test_target_gap_uses_last_forecast_year() {
        let report = pipeline().run(&dataset(), d(2025, 1, 1)).unwrap();
        assert_eq!(report.target_gaps.len(), 3);
        let base = report
            .target_gaps
            .iter()
            .find(|g| g.scenario == Scenario::Base)
            .unwrap();
        assert_eq!(base.forecast_year, 2027);
        assert!((base.forecast_value - 54.0).abs() < 1e-9);
        assert!((base.gap - 6.0).abs() < 1e-9);
        assert!(!base.is_met());
    }

    #[test]
    fn test_fingerprints_deterministic() {
        let a = pipeline().run(&dataset(), d(2025, 1, 1)).unwrap();
        let b = pipeline().run(&dataset(), d(2025, 1, 1)).unwrap();
        assert_eq!(a.input_fingerprint, b.input_fingerprint);
        assert_eq!(a.matrix_fingerprint, b.matrix_fingerprint);
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn test_empty_tables_abort_run() {
        let err = pipeline().run(&Dataset::default(), d(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, FiError::EmptyInput { table: Table::Observations }));

        let mut no_events = dataset();
        no_events.events.clear();
        let err = pipeline().run(&no_events, d(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, FiError::EmptyInput { table: Table::Events }));
    }

    #[test]
    fn test_empty_indicator_list_uses_observed() {
        let config = PipelineConfig {
            indicators: Vec::new(),
            ..PipelineConfig::default()
        };
        let p = Pipeline::new(config, EvidenceStore::empty());
        assert_eq!(p.indicators(&dataset()).len(), 2);
    }
}
