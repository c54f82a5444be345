//! Comparable-country evidence.
//!
//! A read-only catalogue of impacts observed in other countries after events
//! similar to local ones, keyed by evidence category. It is only consulted to
//! fill gaps where no local impact link exists. The store is an ordinary
//! value: build it once, pass it by reference, and swap in a different one
//! for tests.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::confidence::EvidenceConfidence;
use crate::error::FiResult;
use crate::indicator::IndicatorCode;
use crate::record::EventCategory;

/// Impact of a comparator event on one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorEvidence {
    /// Percentage points observed in the comparator country.
    pub magnitude: f64,
    /// Months from the event until the effect was seen.
    pub lag_months: u32,
    /// Confidence before transferability scaling.
    pub confidence: EvidenceConfidence,
}

/// One comparator country's experience with an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableEntry {
    /// Human-readable label, e.g. `M-Pesa launch (2007)`.
    pub event: String,
    /// Observed impact per indicator.
    pub impact: BTreeMap<IndicatorCode, IndicatorEvidence>,
}

/// Evidence categories consulted for an event category.
///
/// Categories with no comparable experience map to an empty slice; that is
/// a valid "no evidence" answer, not an error.
#[must_use]
pub fn evidence_keys(category: &EventCategory) -> &'static [&'static str] {
    match category {
        EventCategory::Policy => &["interoperability", "qr_standardization"],
        EventCategory::ProductLaunch | EventCategory::MarketEntry => &["mobile_money_launch"],
        EventCategory::Infrastructure => &["agent_expansion"],
        EventCategory::Other(_) => &[],
    }
}

/// Catalogue of comparable-country impacts: key → country → entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceStore {
    categories: BTreeMap<String, BTreeMap<String, ComparableEntry>>,
}

impl EvidenceStore {
    /// An empty store.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The reference catalogue of East African, South Asian and Kenyan
    /// interoperability experience.
    #[must_use]
    pub fn reference() -> Self {
        Self::empty()
            .with_entry(
                "mobile_money_launch",
                "kenya",
                "M-Pesa launch (2007)",
                &[("ACC_MM_ACCOUNT", 15.0, 36, 0.9), ("USG_DIGITAL_PAYMENT", 12.0, 24, 0.8)],
            )
            .with_entry(
                "mobile_money_launch",
                "tanzania",
                "M-Pesa launch (2008)",
                &[("ACC_MM_ACCOUNT", 10.0, 48, 0.8), ("USG_DIGITAL_PAYMENT", 8.0, 36, 0.7)],
            )
            .with_entry(
                "interoperability",
                "kenya",
                "PesaLink launch (2018)",
                &[("USG_DIGITAL_PAYMENT", 5.0, 12, 0.8), ("INF_TRANSACTION_VOLUME", 40.0, 6, 0.9)],
            )
            .with_entry(
                "qr_standardization",
                "india",
                "UPI QR standardization (2016)",
                &[("USG_MERCHANT_PAYMENT", 8.0, 18, 0.85), ("USG_DIGITAL_PAYMENT", 5.0, 12, 0.8)],
            )
            .with_entry(
                "agent_expansion",
                "bangladesh",
                "Agent banking expansion (2013)",
                &[("ACC_OWNERSHIP", 7.0, 36, 0.8), ("INF_AGENT_DENSITY", 15.0, 24, 0.9)],
            )
    }

    /// Loads a store from a JSON file shaped like the serialized catalogue.
    ///
    /// # Errors
    ///
    /// Returns an I/O or JSON error if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> FiResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Adds (or replaces) one country entry under `key`.
    ///
    /// Rows whose indicator code or confidence is invalid are ignored.
    #[must_use]
    pub fn with_entry(
        mut self,
        key: &str,
        country: &str,
        event: &str,
        impacts: &[(&str, f64, u32, f64)],
    ) -> Self {
        let impact = impacts
            .iter()
            .filter_map(|&(code, magnitude, lag_months, confidence)| {
                let code = IndicatorCode::new(code).ok()?;
                let confidence = EvidenceConfidence::new(confidence).ok()?;
                Some((
                    code,
                    IndicatorEvidence {
                        magnitude,
                        lag_months,
                        confidence,
                    },
                ))
            })
            .collect();
        self.insert(
            key,
            country,
            ComparableEntry {
                event: event.to_string(),
                impact,
            },
        );
        self
    }

    /// Inserts (or replaces) one country entry under `key`.
    pub fn insert(&mut self, key: impl Into<String>, country: impl Into<String>, entry: ComparableEntry) {
        self.categories
            .entry(key.into())
            .or_default()
            .insert(country.into(), entry);
    }

    /// Country entries for an evidence key; empty if the key is unknown.
    #[must_use]
    pub fn lookup(&self, key: &str) -> &BTreeMap<String, ComparableEntry> {
        static EMPTY: BTreeMap<String, ComparableEntry> = BTreeMap::new();
        self.categories.get(key).unwrap_or(&EMPTY)
    }

    /// All (key, country, entry) triples relevant to an event category, in
    /// the order of `evidence_keys` then country name.
    pub fn for_category<'a>(
        &'a self,
        category: &EventCategory,
    ) -> impl Iterator<Item = (&'static str, &'a str, &'a ComparableEntry)> + 'a {
        evidence_keys(category).iter().flat_map(move |&key| {
            self.lookup(key)
                .iter()
                .map(move |(country, entry)| (key, country.as_str(), entry))
        })
    }

    /// Number of evidence keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// True when no evidence key is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_catalogue() {
        let store = EvidenceStore::reference();
        assert_eq!(store.len(), 4);

        let mm = store.lookup("mobile_money_launch");
        assert_eq!(mm.len(), 2);
        let kenya = &mm["kenya"];
        assert_eq!(kenya.event, "M-Pesa launch (2007)");
        let acc = &kenya.impact[&IndicatorCode::new("ACC_MM_ACCOUNT").unwrap()];
        assert_eq!(acc.magnitude, 15.0);
        assert_eq!(acc.lag_months, 36);
        assert_eq!(acc.confidence.value(), 0.9);
    }

    #[test]
    fn test_lookup_unknown_is_empty() {
        let store = EvidenceStore::reference();
        assert!(store.lookup("cash_transfer").is_empty());
    }

    #[test]
    fn test_evidence_keys_mapping() {
        assert_eq!(
            evidence_keys(&EventCategory::Policy),
            &["interoperability", "qr_standardization"]
        );
        assert_eq!(evidence_keys(&EventCategory::ProductLaunch), &["mobile_money_launch"]);
        assert_eq!(evidence_keys(&EventCategory::MarketEntry), &["mobile_money_launch"]);
        assert_eq!(evidence_keys(&EventCategory::Infrastructure), &["agent_expansion"]);
        assert!(evidence_keys(&EventCategory::Other("pricing".into())).is_empty());
    }

    #[test]
    fn test_for_category_policy() {
        let store = EvidenceStore::reference();
        let entries: Vec<_> = store.for_category(&EventCategory::Policy).collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "interoperability");
        assert_eq!(entries[0].1, "kenya");
        assert_eq!(entries[1].0, "qr_standardization");
        assert_eq!(entries[1].1, "india");
    }

    #[test]
    fn test_json_roundtrip_preserves_catalogue() {
        let store = EvidenceStore::reference();
        let json = serde_json::to_string(&store).unwrap();
        let back: EvidenceStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, store);
    }

    #[test]
    fn test_with_entry_skips_invalid_rows() {
        let store = EvidenceStore::empty().with_entry(
            "agent_expansion",
            "peru",
            "Agent rollout",
            &[("ACC_OWNERSHIP", 3.0, 12, 0.7), ("bad code", 1.0, 1, 0.5), ("INF_AGENT_DENSITY", 2.0, 6, 1.7)],
        );
        assert_eq!(store.lookup("agent_expansion")["peru"].impact.len(), 1);
    }
}
