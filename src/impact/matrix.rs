use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EstimationConfig;
use crate::evidence::EvidenceStore;
use crate::indicator::IndicatorCode;
use crate::record::{Event, ImpactDirection, ImpactLink, Observation};

/// One filled cell of the association matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ImpactCell {
    /// Written from an explicit impact link.
    Direct {
        /// Direction recorded on the link.
        direction: ImpactDirection,
        /// Unsigned magnitude in percentage points.
        magnitude: f64,
        /// Months until the effect materializes.
        lag_months: u32,
    },
    /// Filled in from comparable-country evidence, already scaled.
    Comparable {
        /// Country the evidence comes from.
        country: String,
        /// Signed, scaled magnitude in percentage points.
        magnitude: f64,
        /// Months until the effect materializes.
        lag_months: u32,
    },
}

impl ImpactCell {
    /// Signed magnitude in percentage points.
    #[must_use]
    pub fn score(&self) -> f64 {
        match self {
            Self::Direct {
                direction, magnitude, ..
            } => magnitude * direction.sign(),
            Self::Comparable { magnitude, .. } => *magnitude,
        }
    }

    /// True for cells written from an impact link.
    #[must_use]
    pub const fn is_direct(&self) -> bool {
        matches!(self, Self::Direct { .. })
    }
}

impl fmt::Display for ImpactCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct {
                direction,
                magnitude,
                lag_months,
            } => write!(f, "{}: {magnitude:?}pp (lag: {lag_months}m)", direction.letter()),
            Self::Comparable {
                magnitude, lag_months, ..
            } => write!(f, "C*: {magnitude:.1}pp (lag: {lag_months}m)"),
        }
    }
}

/// Events × indicators association grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactMatrix {
    events: Vec<String>,
    indicators: Vec<IndicatorCode>,
    /// Row-major, `events.len() * indicators.len()` cells.
    cells: Vec<Option<ImpactCell>>,
}

impl ImpactMatrix {
    /// Creates an empty matrix; duplicate labels are dropped, first wins.
    #[must_use]
    pub fn empty<'e, 'i>(
        events: impl IntoIterator<Item = &'e str>,
        indicators: impl IntoIterator<Item = &'i IndicatorCode>,
    ) -> Self {
        let mut rows: Vec<String> = Vec::new();
        for name in events {
            if !rows.iter().any(|r| r == name) {
                rows.push(name.to_string());
            }
        }
        let mut cols: Vec<IndicatorCode> = Vec::new();
        for code in indicators {
            if !cols.contains(code) {
                cols.push(code.clone());
            }
        }
        let cells = vec![None; rows.len() * cols.len()];
        Self {
            events: rows,
            indicators: cols,
            cells,
        }
    }

    /// Row labels (event names).
    #[must_use]
    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// Column labels.
    #[must_use]
    pub fn indicators(&self) -> &[IndicatorCode] {
        &self.indicators
    }

    /// (rows, columns)
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.events.len(), self.indicators.len())
    }

    fn index(&self, event: &str, indicator: &str) -> Option<usize> {
        let row = self.events.iter().position(|e| e == event)?;
        let col = self.indicators.iter().position(|c| c.as_str() == indicator)?;
        Some(row * self.indicators.len() + col)
    }

    /// Cell at (event name, indicator code), if filled.
    #[must_use]
    pub fn get(&self, event: &str, indicator: &str) -> Option<&ImpactCell> {
        self.index(event, indicator).and_then(|i| self.cells[i].as_ref())
    }

    /// Writes a cell if both labels exist. Returns whether it was written.
    pub fn set(&mut self, event: &str, indicator: &str, cell: ImpactCell) -> bool {
        match self.index(event, indicator) {
            Some(i) => {
                self.cells[i] = Some(cell);
                true
            }
            None => false,
        }
    }

    /// Writes a cell only if it exists and is empty.
    pub fn fill_if_empty(&mut self, event: &str, indicator: &str, cell: ImpactCell) -> bool {
        match self.index(event, indicator) {
            Some(i) if self.cells[i].is_none() => {
                self.cells[i] = Some(cell);
                true
            }
            _ => false,
        }
    }

    /// Iterates rows as (event, cells-in-column-order).
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[Option<ImpactCell>])> {
        let width = self.indicators.len().max(1);
        self.events
            .iter()
            .map(String::as_str)
            .zip(self.cells.chunks(width).chain(std::iter::repeat(&[][..])))
    }

    /// Number of filled cells.
    #[must_use]
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Stable content hash, usable as a cache key for the built artifact.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for e in &self.events {
            hasher.update(e.as_bytes());
            hasher.update(&[0x1f]);
        }
        hasher.update(&[0x1e]);
        for c in &self.indicators {
            hasher.update(c.as_str().as_bytes());
            hasher.update(&[0x1f]);
        }
        hasher.update(&[0x1e]);
        for cell in &self.cells {
            match cell {
                Some(cell) => hasher.update(cell.to_string().as_bytes()),
                None => hasher.update(b"-"),
            };
            hasher.update(&[0x1f]);
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Builds the descriptive association matrix.
#[derive(Debug, Clone)]
pub struct ImpactMatrixBuilder<'a> {
    evidence: &'a EvidenceStore,
    config: EstimationConfig,
}

impl<'a> ImpactMatrixBuilder<'a> {
    /// Creates a builder over an evidence catalogue.
    #[must_use]
    pub fn new(evidence: &'a EvidenceStore, config: EstimationConfig) -> Self {
        Self { evidence, config }
    }

    /// Builds the matrix: rows are events, columns are observed indicators.
    ///
    /// Direct link evidence is written first; links that fail validation are
    /// left out. Comparable-country evidence only fills cells that are still
    /// empty afterwards.
    #[must_use]
    pub fn build(&self, events: &[Event], links: &[ImpactLink], observations: &[Observation]) -> ImpactMatrix {
        let mut matrix = ImpactMatrix::empty(
            events.iter().map(|e| e.event_name.as_str()),
            observations.iter().map(|o| &o.indicator_code),
        );

        let by_id: HashMap<&str, &Event> = events.iter().map(|e| (e.event_id.as_str(), e)).collect();
        for link in links {
            let Some(event) = by_id.get(link.parent_id.as_str()) else {
                warn!(parent_id = %link.parent_id, "impact link references unknown event; not placed in matrix");
                continue;
            };
            if let Err(err) = link.validate() {
                warn!(parent_id = %link.parent_id, indicator = %link.related_indicator, "malformed impact link; not placed in matrix: {err}");
                continue;
            }
            matrix.set(
                &event.event_name,
                link.related_indicator.as_str(),
                ImpactCell::Direct {
                    direction: link.impact_direction,
                    magnitude: link.impact_magnitude,
                    lag_months: link.lag_months,
                },
            );
        }

        let mut comparable = 0usize;
        let rows: Vec<String> = matrix.events().to_vec();
        for name in &rows {
            let Some(event) = events.iter().find(|e| &e.event_name == name) else {
                continue;
            };
            for (_key, country, entry) in self.evidence.for_category(&event.event_category) {
                for (code, evidence) in &entry.impact {
                    let cell = ImpactCell::Comparable {
                        country: country.to_string(),
                        magnitude: evidence.magnitude * self.config.comparable_magnitude_scale,
                        lag_months: evidence.lag_months,
                    };
                    if matrix.fill_if_empty(name, code.as_str(), cell) {
                        comparable += 1;
                    }
                }
            }
        }

        let (rows, cols) = matrix.shape();
        info!(rows, cols, filled = matrix.filled(), comparable, "impact matrix built");
        matrix
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::confidence::EvidenceConfidence;
    use crate::record::{EventCategory, EvidenceBasis};

    fn obs(code: &str, year: i32, value: f64) -> Observation {
        Observation::new(
            IndicatorCode::new(code).unwrap(),
            value,
            NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
        )
    }

    fn link(parent: &str, indicator: &str, direction: ImpactDirection, magnitude: f64, lag: u32) -> ImpactLink {
        ImpactLink {
            parent_id: parent.to_string(),
            related_indicator: IndicatorCode::new(indicator).unwrap(),
            impact_direction: direction,
            impact_magnitude: magnitude,
            lag_months: lag,
            evidence_basis: EvidenceBasis::DirectObservation,
            confidence: EvidenceConfidence::new(0.7).unwrap(),
            notes: String::new(),
        }
    }

    fn fixture() -> (Vec<Event>, Vec<ImpactLink>, Vec<Observation>) {
        let events = vec![
            Event::new("EVT_1", "Telebirr Launch", NaiveDate::from_ymd_opt(2021, 5, 1), EventCategory::ProductLaunch),
            Event::new("EVT_2", "Fee regulation", NaiveDate::from_ymd_opt(2022, 1, 1), EventCategory::Other("pricing".into())),
        ];
        let links = vec![
            link("EVT_1", "ACC_MM_ACCOUNT", ImpactDirection::Positive, 4.5, 12),
            link("EVT_2", "USG_DIGITAL_PAYMENT", ImpactDirection::Negative, 1.0, 6),
            link("EVT_9", "ACC_OWNERSHIP", ImpactDirection::Positive, 1.0, 6),
        ];
        let observations = vec![
            obs("ACC_OWNERSHIP", 2021, 46.0),
            obs("ACC_MM_ACCOUNT", 2021, 4.7),
            obs("USG_DIGITAL_PAYMENT", 2021, 20.0),
            obs("ACC_OWNERSHIP", 2024, 49.0),
        ];
        (events, links, observations)
    }

    #[test]
    fn test_shape_from_events_and_observations() {
        let store = EvidenceStore::reference();
        let (events, links, observations) = fixture();
        let m = ImpactMatrixBuilder::new(&store, EstimationConfig::default()).build(&events, &links, &observations);
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.indicators()[0].as_str(), "ACC_OWNERSHIP");
    }

    #[test]
    fn test_direct_cells_and_descriptor() {
        let store = EvidenceStore::reference();
        let (events, links, observations) = fixture();
        let m = ImpactMatrixBuilder::new(&store, EstimationConfig::default()).build(&events, &links, &observations);

        let cell = m.get("Telebirr Launch", "ACC_MM_ACCOUNT").unwrap();
        assert!(cell.is_direct());
        assert_eq!(cell.to_string(), "P: 4.5pp (lag: 12m)");

        let neg = m.get("Fee regulation", "USG_DIGITAL_PAYMENT").unwrap();
        assert_eq!(neg.to_string(), "N: 1.0pp (lag: 6m)");
        assert_eq!(neg.score(), -1.0);
    }

    #[test]
    fn test_direct_evidence_not_overwritten() {
        let store = EvidenceStore::reference();
        let (events, links, observations) = fixture();
        let m = ImpactMatrixBuilder::new(&store, EstimationConfig::default()).build(&events, &links, &observations);

        // Product launch maps to mobile_money_launch, which also covers
        // ACC_MM_ACCOUNT; the explicit link must survive.
        let cell = m.get("Telebirr Launch", "ACC_MM_ACCOUNT").unwrap();
        assert_eq!(
            cell,
            &ImpactCell::Direct {
                direction: ImpactDirection::Positive,
                magnitude: 4.5,
                lag_months: 12,
            }
        );

        // Kenya is visited before Tanzania; the first fill sticks.
        let filled = m.get("Telebirr Launch", "USG_DIGITAL_PAYMENT").unwrap();
        assert!(!filled.is_direct());
        assert_eq!(filled.to_string(), "C*: 8.4pp (lag: 24m)");
    }

    #[test]
    fn test_unmapped_category_left_empty() {
        let store = EvidenceStore::reference();
        let (events, links, observations) = fixture();
        let m = ImpactMatrixBuilder::new(&store, EstimationConfig::default()).build(&events, &links, &observations);
        assert!(m.get("Fee regulation", "ACC_OWNERSHIP").is_none());
        assert!(m.get("Fee regulation", "ACC_MM_ACCOUNT").is_none());
    }

    #[test]
    fn test_indicator_outside_columns_ignored() {
        let store = EvidenceStore::reference();
        let (events, links, observations) = fixture();
        let m = ImpactMatrixBuilder::new(&store, EstimationConfig::default()).build(&events, &links, &observations);
        // INF_AGENT_DENSITY is not observed, so it has no column.
        assert!(m.get("Telebirr Launch", "INF_AGENT_DENSITY").is_none());
        assert_eq!(m.filled(), 3);
    }

    #[test]
    fn test_malformed_links_not_written() {
        let store = EvidenceStore::reference();
        let (events, _, observations) = fixture();
        let links = vec![
            link("EVT_1", "ACC_MM_ACCOUNT", ImpactDirection::Positive, f64::NAN, 3),
            link("EVT_2", "USG_DIGITAL_PAYMENT", ImpactDirection::Negative, -1.0, 6),
        ];
        let m = ImpactMatrixBuilder::new(&store, EstimationConfig::default()).build(&events, &links, &observations);

        // The launch row falls back to comparable evidence; the pricing
        // category has none, so its cell stays empty.
        let cell = m.get("Telebirr Launch", "ACC_MM_ACCOUNT").unwrap();
        assert!(!cell.is_direct());
        assert!(cell.score().is_finite());
        assert!(m.get("Fee regulation", "USG_DIGITAL_PAYMENT").is_none());
    }

    #[test]
    fn test_build_is_deterministic() {
        let store = EvidenceStore::reference();
        let (events, links, observations) = fixture();
        let builder = ImpactMatrixBuilder::new(&store, EstimationConfig::default());
        let a = builder.build(&events, &links, &observations);
        let b = builder.build(&events, &links, &observations);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let code = IndicatorCode::new("ACC_OWNERSHIP").unwrap();
        let mut a = ImpactMatrix::empty(["E1"], [&code]);
        let before = a.fingerprint();
        assert!(a.fill_if_empty(
            "E1",
            "ACC_OWNERSHIP",
            ImpactCell::Comparable {
                country: "kenya".into(),
                magnitude: 1.0,
                lag_months: 1,
            }
        ));
        assert_ne!(before, a.fingerprint());
        assert!(!a.fill_if_empty(
            "E1",
            "ACC_OWNERSHIP",
            ImpactCell::Comparable {
                country: "india".into(),
                magnitude: 2.0,
                lag_months: 1,
            }
        ));
    }

    #[test]
    fn test_rows_iteration() {
        let store = EvidenceStore::reference();
        let (events, links, observations) = fixture();
        let m = ImpactMatrixBuilder::new(&store, EstimationConfig::default()).build(&events, &links, &observations);
        let rows: Vec<_> = m.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "Telebirr Launch");
        assert_eq!(rows[0].1.len(), 3);
    }
}
