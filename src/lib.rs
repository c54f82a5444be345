//! # fi-forecast - Event Impacts and Scenario Forecasts for Financial Inclusion
//!
//! fi-forecast turns a table of indicator observations, a table of policy and
//! market events, and explicit event → indicator links into quantified
//! event impacts and three-scenario forecasts of each indicator.
//!
//! ## Core Concepts
//!
//! - **Indicator**: a percentage-valued series identified by a pillar-prefixed code
//! - **EventImpact**: one event's estimated effect on one indicator, with lag and confidence
//! - **ImpactMatrix**: events × indicators, direct links first, comparable evidence second
//! - **ScenarioForecast**: trend plus scaled future events, with residual-based bounds
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fi_forecast::{Dataset, EvidenceStore, Pipeline, PipelineConfig};
//!
//! let (dataset, load) = Dataset::load_dir("data")?;
//! let pipeline = Pipeline::new(PipelineConfig::default(), EvidenceStore::reference());
//! let report = pipeline.run(&dataset, target_date)?.with_load_report(load);
//! fi_forecast::export::write_all(&report, "out")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod confidence;
pub mod error;
pub mod indicator;
pub mod record;
pub mod skip;
pub mod time;

// Evidence and estimation
pub mod evidence;
pub mod impact;
pub mod trend;

// Forecasting
pub mod forecast;

// Run boundary
pub mod config;
pub mod dataset;
pub mod export;
pub mod pipeline;

// Re-export primary types at crate root for convenience
pub use confidence::{ConfidenceLevel, EvidenceConfidence};
pub use error::{FiError, FiResult, Table, ValidationError};
pub use indicator::{IndicatorCode, Pillar};
pub use record::{Event, EventCategory, EvidenceBasis, ImpactDirection, ImpactLink, Observation, Target};
pub use skip::{SkipKind, Skipped};
pub use time::YearRange;

pub use evidence::{ComparableEntry, EvidenceStore, IndicatorEvidence};
pub use impact::{
    aggregate_to_date, validate_against_historical, AggregateImpact, EventImpact, ImpactCell, ImpactEstimator,
    ImpactMatrix, ImpactMatrixBuilder, ImpactShape, ValidationReport, ValidationSummary,
};
pub use trend::{TrendEstimator, TrendFit};

pub use forecast::{
    AnticipatedEvent, ForecastPoint, ForecastRow, IndicatorForecast, Scenario, ScenarioForecast, ScenarioForecaster,
    ScenarioProfiles,
};

pub use config::{AggregationConfig, EstimationConfig, PipelineConfig};
pub use dataset::{Dataset, LoadReport};
pub use pipeline::{Pipeline, PipelineReport, TargetGap};
