//! Loading the input tables.
//!
//! Rows are read as raw strings and converted to typed records one at a
//! time. A bad row is recorded in the [`LoadReport`] and skipped; only I/O
//! failures and a table left with nothing usable abort the load.

use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::confidence::EvidenceConfidence;
use crate::error::{FiError, FiResult, Table, ValidationError};
use crate::indicator::{IndicatorCode, Pillar};
use crate::record::{Event, EventCategory, EvidenceBasis, ImpactLink, Observation, Target};
use crate::skip::{SkipKind, Skipped};
use crate::time::parse_date;

/// Observation table file name.
pub const OBSERVATIONS_FILE: &str = "observations.csv";
/// Event table file name.
pub const EVENTS_FILE: &str = "events.csv";
/// Impact link table file name.
pub const IMPACT_LINKS_FILE: &str = "impact_links.csv";
/// Target table file name; optional.
pub const TARGETS_FILE: &str = "targets.csv";

/// All typed input records for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Indicator measurements.
    pub observations: Vec<Observation>,
    /// Recorded events.
    pub events: Vec<Event>,
    /// Explicit event-indicator links.
    pub links: Vec<ImpactLink>,
    /// Policy targets; may be empty.
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// Row counts and rejected rows from a load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Observations kept.
    pub observations: usize,
    /// Events kept.
    pub events: usize,
    /// Impact links kept.
    pub impact_links: usize,
    /// Targets kept.
    pub targets: usize,
    /// Rows rejected, one entry each.
    pub skipped: Vec<Skipped>,
}

impl LoadReport {
    fn reject(&mut self, table: Table, row: usize, reason: String) {
        let err = FiError::MalformedRecord { table, row, reason };
        warn!("{err}");
        self.skipped
            .push(Skipped::from_error(SkipKind::Row { table }, row.to_string(), &err));
    }
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    indicator_code: String,
    #[serde(default)]
    pillar: Option<String>,
    value_numeric: String,
    observation_date: String,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(alias = "id")]
    event_id: String,
    #[serde(alias = "name")]
    event_name: String,
    #[serde(default)]
    event_date: Option<String>,
    #[serde(default, alias = "category")]
    event_category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawImpactLink {
    parent_id: String,
    related_indicator: String,
    impact_direction: String,
    impact_magnitude: String,
    #[serde(default)]
    lag_months: Option<String>,
    #[serde(default)]
    evidence_basis: Option<String>,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTarget {
    indicator_code: String,
    target_value: String,
    target_year: String,
    #[serde(default)]
    label: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_number(field: &'static str, text: &str) -> Result<f64, ValidationError> {
    let value: f64 = text.trim().parse().map_err(|_| ValidationError::InvalidField {
        field,
        reason: format!("'{}' is not a number", text.trim()),
    })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NonFinite { field, value })
    }
}

/// Whole months; "12" and "12.0" are both accepted.
fn parse_lag(text: Option<&str>) -> Result<u32, ValidationError> {
    let Some(text) = non_blank(text) else {
        return Ok(0);
    };
    if let Ok(months) = text.parse::<u32>() {
        return Ok(months);
    }
    let value = parse_number("lag_months", text)?;
    if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(ValidationError::InvalidField {
            field: "lag_months",
            reason: format!("'{text}' is not a whole non-negative number of months"),
        });
    }
    Ok(value as u32)
}

impl RawObservation {
    fn into_record(self) -> Result<Observation, ValidationError> {
        let code = IndicatorCode::new(self.indicator_code.trim())?;
        if let Some(pillar) = non_blank(self.pillar.as_deref()) {
            let pillar: Pillar = pillar.parse()?;
            if pillar != code.pillar() {
                return Err(ValidationError::InvalidField {
                    field: "pillar",
                    reason: format!("'{pillar}' does not match the prefix of {code}"),
                });
            }
        }
        let value = parse_number("value_numeric", &self.value_numeric)?;
        let date = parse_date("observation_date", &self.observation_date)?;
        Ok(Observation::new(code, value, date))
    }
}

impl RawEvent {
    fn into_record(self) -> Result<Event, ValidationError> {
        let event_id = self.event_id.trim();
        if event_id.is_empty() {
            return Err(ValidationError::InvalidField {
                field: "event_id",
                reason: "must not be empty".to_string(),
            });
        }
        let date = non_blank(self.event_date.as_deref())
            .map(|d| parse_date("event_date", d))
            .transpose()?;
        let category = match non_blank(self.event_category.as_deref()).map(str::parse::<EventCategory>) {
            Some(Ok(category)) => category,
            Some(Err(never)) => match never {},
            None => EventCategory::Other("other".to_string()),
        };
        let name = self.event_name.trim();
        let name = if name.is_empty() { event_id } else { name };
        Ok(Event::new(event_id, name, date, category))
    }
}

impl RawImpactLink {
    fn into_record(self) -> Result<ImpactLink, ValidationError> {
        let link = ImpactLink {
            parent_id: self.parent_id.trim().to_string(),
            related_indicator: IndicatorCode::new(self.related_indicator.trim())?,
            impact_direction: self.impact_direction.parse()?,
            impact_magnitude: parse_number("impact_magnitude", &self.impact_magnitude)?,
            lag_months: parse_lag(self.lag_months.as_deref())?,
            evidence_basis: non_blank(self.evidence_basis.as_deref())
                .map_or(Ok(EvidenceBasis::ExpertJudgment), str::parse)?,
            confidence: non_blank(self.confidence.as_deref())
                .map_or(Ok(EvidenceConfidence::default()), EvidenceConfidence::parse)?,
            notes: self.notes.unwrap_or_default().trim().to_string(),
        };
        link.validate()?;
        Ok(link)
    }
}

impl RawTarget {
    fn into_record(self) -> Result<Target, ValidationError> {
        let target_year = self
            .target_year
            .trim()
            .parse::<i32>()
            .map_err(|_| ValidationError::InvalidField {
                field: "target_year",
                reason: format!("'{}' is not a year", self.target_year.trim()),
            })?;
        Ok(Target {
            indicator_code: IndicatorCode::new(self.indicator_code.trim())?,
            target_value: parse_number("target_value", &self.target_value)?,
            target_year,
            label: self.label.unwrap_or_default().trim().to_string(),
        })
    }
}

/// Reads one table as (row, record) pairs. Rows are numbered from 1,
/// excluding the header.
fn read_rows<R, Raw, T>(
    reader: R,
    table: Table,
    report: &mut LoadReport,
    convert: impl Fn(Raw) -> Result<T, ValidationError>,
) -> FiResult<Vec<(usize, T)>>
where
    R: Read,
    Raw: DeserializeOwned,
{
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut out = Vec::new();
    for (idx, raw) in csv.deserialize::<Raw>().enumerate() {
        let row = idx + 1;
        let raw = match raw {
            Ok(raw) => raw,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                report.reject(table, row, err.to_string());
                continue;
            }
        };
        match convert(raw) {
            Ok(record) => out.push((row, record)),
            Err(err) => report.reject(table, row, err.to_string()),
        }
    }
    debug!(%table, rows = out.len(), "read table");
    Ok(out)
}

fn read_table<R, Raw, T>(
    reader: R,
    table: Table,
    report: &mut LoadReport,
    convert: impl Fn(Raw) -> Result<T, ValidationError>,
) -> FiResult<Vec<T>>
where
    R: Read,
    Raw: DeserializeOwned,
{
    Ok(read_rows(reader, table, report, convert)?
        .into_iter()
        .map(|(_, record)| record)
        .collect())
}

impl Dataset {
    /// Bundles already-typed records.
    #[must_use]
    pub fn new(
        observations: Vec<Observation>,
        events: Vec<Event>,
        links: Vec<ImpactLink>,
        targets: Vec<Target>,
    ) -> Self {
        Self {
            observations,
            events,
            links,
            targets,
        }
    }

    /// Loads the tables from CSV readers.
    ///
    /// Later rows reusing an `event_id` are rejected.
    ///
    /// # Errors
    ///
    /// Returns `FiError::Csv` on I/O failure and `FiError::EmptyInput` if
    /// no observation or no event survives.
    pub fn from_readers<O: Read, E: Read, L: Read, T: Read>(
        observations: O,
        events: E,
        links: L,
        targets: Option<T>,
    ) -> FiResult<(Self, LoadReport)> {
        let mut report = LoadReport::default();

        let observations = read_table(observations, Table::Observations, &mut report, RawObservation::into_record)?;
        let raw_events = read_rows(events, Table::Events, &mut report, RawEvent::into_record)?;
        let links = read_table(links, Table::ImpactLinks, &mut report, RawImpactLink::into_record)?;
        let targets = match targets {
            Some(reader) => read_table(reader, Table::Targets, &mut report, RawTarget::into_record)?,
            None => Vec::new(),
        };

        let mut seen = HashSet::new();
        let mut events = Vec::with_capacity(raw_events.len());
        for (row, event) in raw_events {
            if seen.insert(event.event_id.clone()) {
                events.push(event);
            } else {
                report.reject(Table::Events, row, format!("duplicate event_id '{}'", event.event_id));
            }
        }

        if observations.is_empty() {
            return Err(FiError::EmptyInput {
                table: Table::Observations,
            });
        }
        if events.is_empty() {
            return Err(FiError::EmptyInput { table: Table::Events });
        }

        report.observations = observations.len();
        report.events = events.len();
        report.impact_links = links.len();
        report.targets = targets.len();
        info!(
            observations = report.observations,
            events = report.events,
            impact_links = report.impact_links,
            targets = report.targets,
            skipped = report.skipped.len(),
            "loaded dataset"
        );
        Ok((Self::new(observations, events, links, targets), report))
    }

    /// Loads `observations.csv`, `events.csv`, `impact_links.csv` and,
    /// if present, `targets.csv` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns `FiError::Io` if a required file is missing, otherwise as
    /// [`Self::from_readers`].
    pub fn load_dir(dir: impl AsRef<Path>) -> FiResult<(Self, LoadReport)> {
        let dir = dir.as_ref();
        let targets_path = dir.join(TARGETS_FILE);
        let targets = if targets_path.exists() {
            Some(File::open(targets_path)?)
        } else {
            None
        };
        Self::from_readers(
            File::open(dir.join(OBSERVATIONS_FILE))?,
            File::open(dir.join(EVENTS_FILE))?,
            File::open(dir.join(IMPACT_LINKS_FILE))?,
            targets,
        )
    }

    /// Distinct observed indicator codes, sorted.
    #[must_use]
    pub fn observed_indicators(&self) -> Vec<IndicatorCode> {
        self.observations
            .iter()
            .map(|o| o.indicator_code.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Content hash of the typed inputs, stable across runs.
    ///
    /// # Errors
    ///
    /// Returns `FiError::Json` if the records cannot be serialized.
    pub fn fingerprint(&self) -> FiResult<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }
}
