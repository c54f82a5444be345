use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AggregationConfig;
use crate::impact::EventImpact;
use crate::indicator::IndicatorCode;
use crate::record::ImpactDirection;
use crate::time::months_between;

/// Time-adjusted impact totals for one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateImpact {
    /// Indicator rolled up.
    pub indicator_code: IndicatorCode,
    /// Discounted sum of positive impacts.
    pub total_positive: f64,
    /// Discounted sum of negative impacts, as a positive number.
    pub total_negative: f64,
    /// Positive minus negative.
    pub net_impact: f64,
    /// All impacts on this indicator, neutral ones included.
    pub event_count: usize,
    /// Earliest date an impact materializes.
    pub earliest_impact: NaiveDate,
    /// Latest date an impact materializes.
    pub latest_impact: NaiveDate,
}

impl AggregateImpact {
    fn new(indicator_code: IndicatorCode, impact_date: NaiveDate) -> Self {
        Self {
            indicator_code,
            total_positive: 0.0,
            total_negative: 0.0,
            net_impact: 0.0,
            event_count: 0,
            earliest_impact: impact_date,
            latest_impact: impact_date,
        }
    }
}

/// Confidence-weighted impact as seen from `target_date`.
///
/// Impacts that have materialized by `target_date` count in full; later
/// ones are discounted hyperbolically by the months still to wait.
#[must_use]
pub fn adjusted_impact(impact: &EventImpact, target_date: NaiveDate, config: &AggregationConfig) -> f64 {
    let base = impact.expected_magnitude();
    let impact_date = impact.impact_date();
    if impact_date <= target_date {
        return base;
    }
    let months_until = months_between(target_date, impact_date, config.days_per_month);
    base / (1.0 + config.monthly_discount_rate * months_until)
}

/// Rolls impacts up per indicator as of `target_date`.
///
/// Output is sorted by `net_impact`, largest first; ties keep indicator
/// code order.
#[must_use]
pub fn aggregate_to_date(
    impacts: &[EventImpact],
    target_date: NaiveDate,
    config: &AggregationConfig,
) -> Vec<AggregateImpact> {
    let mut by_indicator: BTreeMap<&IndicatorCode, AggregateImpact> = BTreeMap::new();

    for impact in impacts {
        let impact_date = impact.impact_date();
        let adjusted = adjusted_impact(impact, target_date, config);
        let agg = by_indicator
            .entry(&impact.indicator_code)
            .or_insert_with(|| AggregateImpact::new(impact.indicator_code.clone(), impact_date));

        match impact.impact_direction {
            ImpactDirection::Positive => {
                agg.total_positive += adjusted;
                agg.net_impact += adjusted;
            }
            ImpactDirection::Negative => {
                agg.total_negative += adjusted;
                agg.net_impact -= adjusted;
            }
            ImpactDirection::Neutral => {}
        }
        agg.event_count += 1;
        agg.earliest_impact = agg.earliest_impact.min(impact_date);
        agg.latest_impact = agg.latest_impact.max(impact_date);
    }

    let mut out: Vec<AggregateImpact> = by_indicator.into_values().collect();
    out.sort_by(|a, b| b.net_impact.total_cmp(&a.net_impact));
    debug!(indicators = out.len(), %target_date, "aggregated impacts");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::EvidenceConfidence;
    use crate::impact::fixtures::impact;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_future_impact_discounted() {
        let mut i = impact("ACC_OWNERSHIP", d(2020, 1, 1), 5.0, 12);
        i.confidence = EvidenceConfidence::new(0.8).unwrap();
        let cfg = AggregationConfig::default();

        let adjusted = adjusted_impact(&i, d(2019, 1, 1), &cfg);
        let expected = 5.0 * 0.8 / (1.0 + 0.05 * 24.0);
        assert!((adjusted - expected).abs() < 1e-9);
    }

    #[test]
    fn test_realized_impact_full() {
        let mut i = impact("ACC_OWNERSHIP", d(2020, 1, 1), 5.0, 12);
        i.confidence = EvidenceConfidence::new(0.8).unwrap();
        let cfg = AggregationConfig::default();
        assert!((adjusted_impact(&i, d(2021, 1, 1), &cfg) - 4.0).abs() < 1e-12);
        assert!((adjusted_impact(&i, d(2024, 1, 1), &cfg) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_aggregate_net_and_sorting() {
        let mut neg = impact("USG_DIGITAL_PAYMENT", d(2018, 1, 1), 3.0, 0);
        neg.impact_direction = ImpactDirection::Negative;
        let mut neutral = impact("USG_DIGITAL_PAYMENT", d(2019, 1, 1), 9.0, 0);
        neutral.impact_direction = ImpactDirection::Neutral;
        let impacts = vec![
            impact("ACC_OWNERSHIP", d(2018, 1, 1), 2.0, 0),
            impact("ACC_OWNERSHIP", d(2019, 6, 1), 1.0, 6),
            impact("USG_DIGITAL_PAYMENT", d(2018, 1, 1), 1.0, 0),
            neg,
            neutral,
        ];

        let out = aggregate_to_date(&impacts, d(2024, 1, 1), &AggregationConfig::default());
        assert_eq!(out.len(), 2);

        assert_eq!(out[0].indicator_code.as_str(), "ACC_OWNERSHIP");
        assert!((out[0].net_impact - 3.0).abs() < 1e-12);
        assert_eq!(out[0].event_count, 2);
        assert_eq!(out[0].earliest_impact, d(2018, 1, 1));
        assert_eq!(out[0].latest_impact, d(2019, 12, 1));

        let usg = &out[1];
        assert!((usg.total_positive - 1.0).abs() < 1e-12);
        assert!((usg.total_negative - 3.0).abs() < 1e-12);
        assert!((usg.net_impact + 2.0).abs() < 1e-12);
        assert_eq!(usg.event_count, 3);
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate_to_date(&[], d(2024, 1, 1), &AggregationConfig::default()).is_empty());
    }
}
