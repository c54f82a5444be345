//! Input records: observations, events, impact links and targets.
//!
//! These are the validated, typed rows handed to the core by the loader.
//! Categorical fields are closed enums so a typo in the input fails at the
//! load boundary instead of silently matching nothing later.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::confidence::EvidenceConfidence;
use crate::error::ValidationError;
use crate::indicator::{IndicatorCode, Pillar};

/// A measured indicator value on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Indicator measured.
    pub indicator_code: IndicatorCode,
    /// Pillar of the indicator, matching the code prefix.
    pub pillar: Pillar,
    /// Percentage, 0–100.
    pub value_numeric: f64,
    /// Date the value was measured.
    pub observation_date: NaiveDate,
}

impl Observation {
    /// Creates an observation whose pillar is derived from the code.
    #[must_use]
    pub fn new(indicator_code: IndicatorCode, value_numeric: f64, observation_date: NaiveDate) -> Self {
        Self {
            pillar: indicator_code.pillar(),
            indicator_code,
            value_numeric,
            observation_date,
        }
    }

    /// Calendar year of the observation.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.observation_date.year()
    }
}

/// Category of a recorded event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Regulation, directive or strategy.
    Policy,
    /// A new financial product or service.
    ProductLaunch,
    /// A new provider entering the market.
    MarketEntry,
    /// Networks, ID systems and other rails.
    Infrastructure,
    /// Any category without comparable-country evidence.
    Other(String),
}

impl EventCategory {
    /// Snake-case name as it appears in input files.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Policy => "policy",
            Self::ProductLaunch => "product_launch",
            Self::MarketEntry => "market_entry",
            Self::Infrastructure => "infrastructure",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Ok(match s.as_str() {
            "policy" => Self::Policy,
            "product_launch" => Self::ProductLaunch,
            "market_entry" => Self::MarketEntry,
            "infrastructure" => Self::Infrastructure,
            _ => Self::Other(s),
        })
    }
}

/// A policy, product or market event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique id, referenced by impact links.
    pub event_id: String,
    /// Display name; also the row label of the impact matrix.
    pub event_name: String,
    /// Events without a date cannot be placed on a timeline.
    pub event_date: Option<NaiveDate>,
    /// Category used to find comparable evidence.
    pub event_category: EventCategory,
}

impl Event {
    /// Creates an event.
    #[must_use]
    pub fn new(
        event_id: impl Into<String>,
        event_name: impl Into<String>,
        event_date: Option<NaiveDate>,
        event_category: EventCategory,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_name: event_name.into(),
            event_date,
            event_category,
        }
    }
}

/// Direction of an impact on an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactDirection {
    /// Raises the indicator.
    Positive,
    /// Lowers the indicator.
    Negative,
    /// No expected effect.
    Neutral,
}

impl ImpactDirection {
    /// Sign applied to a magnitude: +1, -1 or 0.
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
            Self::Neutral => 0.0,
        }
    }

    /// Upper-case letter used in matrix descriptors.
    ///
    /// `Neutral` shares `N` with `Negative`, so a descriptor alone cannot
    /// tell them apart; [`Self::sign`] (and the cell score) can.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Positive => 'P',
            Self::Negative => 'N',
            Self::Neutral => 'N',
        }
    }

    /// Lower-case name as it appears in input files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for ImpactDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImpactDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" | "increase" | "+" => Ok(Self::Positive),
            "negative" | "decrease" | "-" => Ok(Self::Negative),
            "neutral" | "none" | "" => Ok(Self::Neutral),
            other => Err(ValidationError::UnknownVariant {
                field: "impact_direction",
                value: other.to_string(),
            }),
        }
    }
}

/// Where an impact estimate comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceBasis {
    /// Measured in this market.
    DirectObservation,
    /// Transferred from another country's experience.
    ComparableCountry,
    /// Analyst judgment; the default when none is given.
    ExpertJudgment,
    /// Estimated by regression.
    RegressionAnalysis,
    /// Produced by a simulation model.
    SimulationModel,
}

impl EvidenceBasis {
    /// Snake-case name as it appears in input files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DirectObservation => "direct_observation",
            Self::ComparableCountry => "comparable_country",
            Self::ExpertJudgment => "expert_judgment",
            Self::RegressionAnalysis => "regression_analysis",
            Self::SimulationModel => "simulation_model",
        }
    }
}

impl fmt::Display for EvidenceBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvidenceBasis {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" | "direct_observation" | "empirical" => Ok(Self::DirectObservation),
            "comparable" | "comparable_country" => Ok(Self::ComparableCountry),
            "expert" | "expert_judgment" | "" => Ok(Self::ExpertJudgment),
            "regression" | "regression_analysis" => Ok(Self::RegressionAnalysis),
            "simulation" | "simulation_model" => Ok(Self::SimulationModel),
            other => Err(ValidationError::UnknownVariant {
                field: "evidence_basis",
                value: other.to_string(),
            }),
        }
    }
}

/// An explicit, data-asserted event → indicator relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactLink {
    /// `event_id` of the parent event.
    pub parent_id: String,
    /// Indicator affected.
    pub related_indicator: IndicatorCode,
    /// Whether the event raises or lowers the indicator.
    pub impact_direction: ImpactDirection,
    /// Percentage points; the sign is carried by `impact_direction`.
    pub impact_magnitude: f64,
    /// Whole months from the event until the effect materializes.
    pub lag_months: u32,
    /// Where the estimate comes from.
    pub evidence_basis: EvidenceBasis,
    /// Confidence in the estimate.
    pub confidence: EvidenceConfidence,
    /// Free-text notes carried through to the impact.
    #[serde(default)]
    pub notes: String,
}

impl ImpactLink {
    /// Checks the numeric fields a link must carry to become an impact.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NonFinite` or `InvalidField` for a
    /// non-finite or negative magnitude.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.impact_magnitude.is_finite() {
            return Err(ValidationError::NonFinite {
                field: "impact_magnitude",
                value: self.impact_magnitude,
            });
        }
        if self.impact_magnitude < 0.0 {
            return Err(ValidationError::InvalidField {
                field: "impact_magnitude",
                reason: format!(
                    "magnitude must be non-negative (sign belongs in impact_direction), got {}",
                    self.impact_magnitude
                ),
            });
        }
        Ok(())
    }
}

/// A policy target for an indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Indicator the target is set on.
    pub indicator_code: IndicatorCode,
    /// Target value in percent.
    pub target_value: f64,
    /// Year the target should be met.
    pub target_year: i32,
    /// Free-text label, e.g. the strategy that sets the target.
    #[serde(default)]
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_pillar_from_code() {
        let obs = Observation::new(
            IndicatorCode::new("USG_DIGITAL_PAYMENT").unwrap(),
            35.0,
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        );
        assert_eq!(obs.pillar, Pillar::Usage);
        assert_eq!(obs.year(), 2024);
    }

    #[test]
    fn test_event_category_parse() {
        assert_eq!("Policy".parse::<EventCategory>().unwrap(), EventCategory::Policy);
        assert_eq!(
            "market_entry".parse::<EventCategory>().unwrap(),
            EventCategory::MarketEntry
        );
        assert_eq!(
            "pricing".parse::<EventCategory>().unwrap(),
            EventCategory::Other("pricing".to_string())
        );
    }

    #[test]
    fn test_direction_parse_and_sign() {
        assert_eq!("positive".parse::<ImpactDirection>().unwrap().sign(), 1.0);
        assert_eq!("Negative".parse::<ImpactDirection>().unwrap().sign(), -1.0);
        assert_eq!("neutral".parse::<ImpactDirection>().unwrap().sign(), 0.0);
        assert!("sideways".parse::<ImpactDirection>().is_err());
        assert_eq!(ImpactDirection::Neutral.letter(), ImpactDirection::Negative.letter());
    }

    #[test]
    fn test_evidence_basis_parse() {
        assert_eq!(
            "direct".parse::<EvidenceBasis>().unwrap(),
            EvidenceBasis::DirectObservation
        );
        assert_eq!(
            "regression_analysis".parse::<EvidenceBasis>().unwrap(),
            EvidenceBasis::RegressionAnalysis
        );
        assert_eq!("".parse::<EvidenceBasis>().unwrap(), EvidenceBasis::ExpertJudgment);
        assert!("hearsay".parse::<EvidenceBasis>().is_err());
    }

    #[test]
    fn test_link_validate() {
        let mut link = ImpactLink {
            parent_id: "EVT_0001".to_string(),
            related_indicator: IndicatorCode::new("ACC_OWNERSHIP").unwrap(),
            impact_direction: ImpactDirection::Positive,
            impact_magnitude: 2.0,
            lag_months: 12,
            evidence_basis: EvidenceBasis::ExpertJudgment,
            confidence: EvidenceConfidence::new(0.6).unwrap(),
            notes: String::new(),
        };
        assert!(link.validate().is_ok());
        link.impact_magnitude = f64::NAN;
        assert!(matches!(link.validate(), Err(ValidationError::NonFinite { .. })));
        link.impact_magnitude = -1.0;
        assert!(matches!(link.validate(), Err(ValidationError::InvalidField { .. })));
    }
}
