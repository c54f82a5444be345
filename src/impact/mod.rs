//! Event impacts: estimation, the association matrix, roll-ups and
//! back-testing.
//!
//! An [`EventImpact`] is the unit every downstream stage consumes. It is
//! built either directly from an impact link or synthesized from
//! comparable-country evidence.

mod aggregate;
mod estimator;
mod matrix;
mod response;
mod validation;

pub use aggregate::{aggregate_to_date, AggregateImpact};
pub use estimator::{EstimationOutcome, ImpactEstimator};
pub use matrix::{ImpactCell, ImpactMatrix, ImpactMatrixBuilder};
pub use response::ImpactShape;
pub use validation::{validate_against_historical, ValidationReport, ValidationRow, ValidationSummary};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::confidence::EvidenceConfidence;
use crate::indicator::{IndicatorCode, Pillar};
use crate::record::{EventCategory, EvidenceBasis, ImpactDirection};
use crate::time::add_months;

/// A quantified effect of one event on one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventImpact {
    /// Id of the source event.
    pub event_id: String,
    /// Name of the source event.
    pub event_name: String,
    /// Date of the source event.
    pub event_date: NaiveDate,
    /// Category of the source event.
    pub event_category: EventCategory,
    /// Indicator affected.
    pub indicator_code: IndicatorCode,
    /// Pillar of the affected indicator.
    pub pillar: Pillar,
    /// Whether the indicator rises or falls.
    pub impact_direction: ImpactDirection,
    /// Percentage points, non-negative; see `impact_direction` for the sign.
    pub impact_magnitude: f64,
    /// Months from the event until the effect materializes.
    pub lag_months: u32,
    /// `ComparableCountry` for synthesized impacts.
    pub evidence_basis: EvidenceBasis,
    /// Confidence, already scaled for comparable evidence.
    pub confidence: EvidenceConfidence,
    /// Link notes, or the comparator the impact was taken from.
    #[serde(default)]
    pub notes: String,
}

impl EventImpact {
    /// Date the effect is expected to materialize.
    #[must_use]
    pub fn impact_date(&self) -> NaiveDate {
        add_months(self.event_date, self.lag_months)
    }

    /// Calendar year of the event.
    #[must_use]
    pub fn event_year(&self) -> i32 {
        self.event_date.year()
    }

    /// Magnitude with the direction's sign applied.
    #[must_use]
    pub fn signed_magnitude(&self) -> f64 {
        self.impact_magnitude * self.impact_direction.sign()
    }

    /// Magnitude weighted by evidence confidence.
    #[must_use]
    pub fn expected_magnitude(&self) -> f64 {
        self.impact_magnitude * self.confidence.value()
    }

    /// Signed effect realized `months` after the event under `shape`.
    #[must_use]
    pub fn effect_after(&self, months: u32, shape: ImpactShape) -> f64 {
        shape.response(self.signed_magnitude(), months)
    }

    /// True for impacts synthesized from comparable evidence.
    #[must_use]
    pub fn is_comparable(&self) -> bool {
        self.evidence_basis == EvidenceBasis::ComparableCountry
    }
}
