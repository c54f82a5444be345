//! Records of entities the pipeline left out, and why.
//!
//! Errors local to one event, link, indicator or row never abort a batch.
//! They are turned into [`Skipped`] entries and travel alongside the partial
//! results so consumers can see what is missing.

use serde::{Deserialize, Serialize};

use crate::error::{FiError, Table};

/// What kind of entity was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum SkipKind {
    /// An event that could not be placed on a timeline.
    Event,
    /// An impact link that was malformed or pointed nowhere.
    ImpactLink,
    /// An indicator that could not be forecast.
    Indicator,
    /// An input row rejected at the load boundary.
    Row {
        /// Table the row came from.
        table: Table,
    },
}

impl std::fmt::Display for SkipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Event => write!(f, "event"),
            Self::ImpactLink => write!(f, "impact link"),
            Self::Indicator => write!(f, "indicator"),
            Self::Row { table } => write!(f, "{table} row"),
        }
    }
}

/// One skipped entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skipped {
    /// What was skipped.
    pub kind: SkipKind,
    /// Event id, indicator code, or row number.
    pub id: String,
    /// Human-readable reason.
    pub reason: String,
}

impl Skipped {
    /// Creates a skip entry.
    #[must_use]
    pub fn new(kind: SkipKind, id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Builds a skip entry from an isolated error.
    #[must_use]
    pub fn from_error(kind: SkipKind, id: impl Into<String>, err: &FiError) -> Self {
        Self::new(kind, id, err.to_string())
    }
}

impl std::fmt::Display for Skipped {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}': {}", self.kind, self.id, self.reason)
    }
}
