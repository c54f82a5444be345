use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::EstimationConfig;
use crate::error::FiError;
use crate::evidence::EvidenceStore;
use crate::impact::EventImpact;
use crate::record::{EvidenceBasis, Event, ImpactDirection, ImpactLink};
use crate::skip::{SkipKind, Skipped};

/// Result of estimating impacts for a set of events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EstimationOutcome {
    /// Impacts in event order, then link (or evidence) order.
    pub impacts: Vec<EventImpact>,
    /// Events and links that contributed nothing, with reasons.
    pub skipped: Vec<Skipped>,
}

/// Turns events into quantified [`EventImpact`] facts.
///
/// Explicit impact links are the source of truth. Events without any link
/// borrow from comparable-country evidence, scaled down for local context.
#[derive(Debug, Clone)]
pub struct ImpactEstimator<'a> {
    evidence: &'a EvidenceStore,
    config: EstimationConfig,
}

impl<'a> ImpactEstimator<'a> {
    /// Creates an estimator over an evidence catalogue.
    #[must_use]
    pub fn new(evidence: &'a EvidenceStore, config: EstimationConfig) -> Self {
        Self { evidence, config }
    }

    /// Produces every impact for `events`.
    ///
    /// Events with no date are skipped. Links naming an unknown event and
    /// links with invalid values are skipped individually; neither stops
    /// estimation for other events.
    #[must_use]
    pub fn estimate(&self, events: &[Event], links: &[ImpactLink]) -> EstimationOutcome {
        let mut outcome = EstimationOutcome::default();

        let known: HashMap<&str, &Event> = events.iter().map(|e| (e.event_id.as_str(), e)).collect();
        let mut by_parent: HashMap<&str, Vec<&ImpactLink>> = HashMap::new();
        for link in links {
            if known.contains_key(link.parent_id.as_str()) {
                by_parent.entry(link.parent_id.as_str()).or_default().push(link);
            } else {
                let err = FiError::UnresolvedReference {
                    parent_id: link.parent_id.clone(),
                };
                warn!(parent_id = %link.parent_id, indicator = %link.related_indicator, "dropping impact link: {err}");
                outcome
                    .skipped
                    .push(Skipped::from_error(SkipKind::ImpactLink, &link.parent_id, &err));
            }
        }

        for event in events {
            let Some(event_date) = event.event_date else {
                debug!(event_id = %event.event_id, "event has no date; skipping");
                outcome.skipped.push(Skipped::new(
                    SkipKind::Event,
                    &event.event_id,
                    "event has no event_date and cannot be placed on a timeline",
                ));
                continue;
            };

            match by_parent.get(event.event_id.as_str()) {
                Some(event_links) => {
                    for link in event_links {
                        match link.validate() {
                            Ok(()) => outcome.impacts.push(Self::from_link(event, event_date, link)),
                            Err(err) => {
                                warn!(event_id = %event.event_id, indicator = %link.related_indicator, "skipping malformed impact link: {err}");
                                outcome.skipped.push(Skipped::new(
                                    SkipKind::ImpactLink,
                                    format!("{}→{}", event.event_id, link.related_indicator),
                                    err.to_string(),
                                ));
                            }
                        }
                    }
                }
                None => {
                    let before = outcome.impacts.len();
                    self.from_comparable(event, event_date, &mut outcome.impacts);
                    debug!(
                        event_id = %event.event_id,
                        category = %event.event_category,
                        synthesized = outcome.impacts.len() - before,
                        "no impact links; used comparable-country evidence"
                    );
                }
            }
        }

        info!(
            events = events.len(),
            impacts = outcome.impacts.len(),
            skipped = outcome.skipped.len(),
            "estimated event impacts"
        );
        outcome
    }

    fn from_link(event: &Event, event_date: chrono::NaiveDate, link: &ImpactLink) -> EventImpact {
        EventImpact {
            event_id: event.event_id.clone(),
            event_name: event.event_name.clone(),
            event_date,
            event_category: event.event_category.clone(),
            indicator_code: link.related_indicator.clone(),
            pillar: link.related_indicator.pillar(),
            impact_direction: link.impact_direction,
            impact_magnitude: link.impact_magnitude,
            lag_months: link.lag_months,
            evidence_basis: link.evidence_basis,
            confidence: link.confidence,
            notes: link.notes.clone(),
        }
    }

    fn from_comparable(&self, event: &Event, event_date: chrono::NaiveDate, out: &mut Vec<EventImpact>) {
        for (_key, country, entry) in self.evidence.for_category(&event.event_category) {
            for (code, evidence) in &entry.impact {
                out.push(EventImpact {
                    event_id: event.event_id.clone(),
                    event_name: event.event_name.clone(),
                    event_date,
                    event_category: event.event_category.clone(),
                    indicator_code: code.clone(),
                    pillar: code.pillar(),
                    impact_direction: ImpactDirection::Positive,
                    impact_magnitude: evidence.magnitude * self.config.comparable_magnitude_scale,
                    lag_months: evidence.lag_months,
                    evidence_basis: EvidenceBasis::ComparableCountry,
                    confidence: evidence.confidence.scaled(self.config.comparable_confidence_scale),
                    notes: format!("Based on {country} experience with {}", entry.event),
                });
            }
        }
    }
}
