//! Error types for fi-forecast.
//!
//! All errors are strongly typed using thiserror. Errors that are local to
//! one entity (an indicator, an event, a row) are isolated by the pipeline
//! and reported as skips; only [`FiError::EmptyInput`] and the load/write
//! boundary errors abort a run.

use thiserror::Error;

/// Which input table a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// `observations.csv`
    Observations,
    /// `events.csv`
    Events,
    /// `impact_links.csv`
    ImpactLinks,
    /// `targets.csv`
    Targets,
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Observations => write!(f, "observations"),
            Self::Events => write!(f, "events"),
            Self::ImpactLinks => write!(f, "impact_links"),
            Self::Targets => write!(f, "targets"),
        }
    }
}

/// Validation errors for individual values.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A confidence outside [0, 1].
    #[error("Confidence value {value} is out of range [0.0, 1.0]")]
    ConfidenceOutOfRange {
        /// The rejected value.
        value: f64,
    },

    /// A confidence string that is neither a number nor a known level.
    #[error("Unknown confidence level '{value}'")]
    UnknownConfidenceLevel {
        /// The rejected text.
        value: String,
    },

    /// An indicator code without a known pillar prefix.
    #[error("Indicator code '{code}' does not follow the <PILLAR>_<NAME> convention")]
    InvalidIndicatorCode {
        /// The rejected code.
        code: String,
    },

    /// A categorical field with an unrecognized value.
    #[error("Unknown {field} value '{value}'")]
    UnknownVariant {
        /// Field name.
        field: &'static str,
        /// The rejected text.
        value: String,
    },

    /// A NaN or infinite number.
    #[error("Field '{field}' must be a finite number, got {value}")]
    NonFinite {
        /// Field name.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Any other field-level problem.
    #[error("Field '{field}' is invalid: {reason}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Top-level error type for fi-forecast.
#[derive(Debug, Error)]
pub enum FiError {
    /// Too few observed years to fit a trend.
    #[error("Indicator {indicator} has {distinct_years} distinct observed years, need at least 2")]
    MissingData {
        /// Indicator code.
        indicator: String,
        /// Distinct years found in the history window.
        distinct_years: usize,
    },

    /// An impact link whose parent event does not exist.
    #[error("Impact link references unknown event '{parent_id}'")]
    UnresolvedReference {
        /// The dangling `parent_id`.
        parent_id: String,
    },

    /// An input row that could not be turned into a record.
    #[error("Malformed {table} record at row {row}: {reason}")]
    MalformedRecord {
        /// Table the row belongs to.
        table: Table,
        /// Row number, from 1, excluding the header.
        row: usize,
        /// Why the row was rejected.
        reason: String,
    },

    /// A required table with no usable rows.
    #[error("No usable {table} in input")]
    EmptyInput {
        /// The empty table.
        table: Table,
    },

    /// A value failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration values the pipeline cannot use.
    #[error("Invalid configuration: {reason}")]
    Config {
        /// What is wrong.
        reason: String,
    },

    /// File system failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader or writer failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding or decoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML syntax or type error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A broken internal invariant, such as a panicked worker.
    #[error("Internal error: {message}")]
    Internal {
        /// Description.
        message: String,
    },
}

impl FiError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if the error only affects one entity and the batch
    /// should carry on without it.
    #[must_use]
    pub const fn is_isolated(&self) -> bool {
        matches!(
            self,
            Self::MissingData { .. }
                | Self::UnresolvedReference { .. }
                | Self::MalformedRecord { .. }
                | Self::Validation(_)
        )
    }
}

/// Result type alias for fi-forecast operations.
pub type FiResult<T> = Result<T, FiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_data_message() {
        let err = FiError::MissingData {
            indicator: "ACC_OWNERSHIP".to_string(),
            distinct_years: 1,
        };
        let msg = format!("{err}");
        assert!(msg.contains("ACC_OWNERSHIP"));
        assert!(msg.contains("at least 2"));
        assert!(err.is_isolated());
    }

    #[test]
    fn test_malformed_record_message() {
        let err = FiError::MalformedRecord {
            table: Table::ImpactLinks,
            row: 7,
            reason: "lag_months is not an integer".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("impact_links"));
        assert!(msg.contains("row 7"));
    }

    #[test]
    fn test_empty_input_is_not_isolated() {
        let err = FiError::EmptyInput {
            table: Table::Events,
        };
        assert!(!err.is_isolated());
        assert!(format!("{err}").contains("events"));
    }

    #[test]
    fn test_validation_converts() {
        let err: FiError = ValidationError::ConfidenceOutOfRange { value: 1.5 }.into();
        assert!(err.is_isolated());
        assert!(format!("{err}").contains("1.5"));
    }

    #[test]
    fn test_config_error() {
        let err = FiError::config("history start after end");
        assert!(!err.is_isolated());
        assert!(format!("{err}").contains("history start"));
    }
}
