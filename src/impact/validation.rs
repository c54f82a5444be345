use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::impact::EventImpact;
use crate::indicator::IndicatorCode;
use crate::record::Observation;

/// Estimated vs realized change around one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRow {
    /// Event tested.
    pub event_name: String,
    /// Indicator tested.
    pub indicator_code: IndicatorCode,
    /// Date of the event.
    pub event_date: NaiveDate,
    /// Latest observation before the event.
    pub pre_value: f64,
    /// Earliest observation after the event.
    pub post_value: f64,
    /// `post_value - pre_value`
    pub actual_change: f64,
    /// Signed magnitude of the estimated impact.
    pub predicted_change: f64,
    /// `actual_change - predicted_change`
    pub error_pp: f64,
    /// `|error_pp / predicted_change|` in percent; 100 when nothing was
    /// predicted but the indicator moved.
    pub error_pct: f64,
    /// Lag of the impact tested.
    pub lag_months: u32,
    /// Confidence of the impact tested.
    pub confidence: f64,
}

/// Overall back-test metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Mean of `|error_pp|`.
    pub mean_absolute_error_pp: f64,
    /// Mean of `|error_pct|`.
    pub mean_absolute_error_pct: f64,
    /// `max(0, 1 - var(error_pp) / var(actual_change))`; `None` when it is
    /// undefined (fewer than two rows, or no variance in actual change).
    pub r_squared: Option<f64>,
    /// Rows the summary is computed over.
    pub validation_count: usize,
}

/// Back-test rows plus summary, if any row could be built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// One row per impact with observations on both sides.
    pub rows: Vec<ValidationRow>,
    /// Metrics over `rows`; `None` when there are none.
    pub summary: Option<ValidationSummary>,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Sample variance (n - 1 denominator).
fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values.iter().copied())?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (values.len() - 1) as f64)
}

fn error_pct(actual: f64, predicted: f64) -> f64 {
    if predicted != 0.0 {
        ((actual - predicted) / predicted).abs() * 100.0
    } else if actual != 0.0 {
        100.0
    } else {
        0.0
    }
}

/// Compares estimated impacts with the change actually observed across
/// each event.
///
/// For every impact (optionally only those on `indicator`) the closest
/// observation strictly before and strictly after the event date are used.
/// Impacts without both sides are left out.
#[must_use]
pub fn validate_against_historical(
    impacts: &[EventImpact],
    observations: &[Observation],
    indicator: Option<&IndicatorCode>,
) -> ValidationReport {
    let mut rows = Vec::new();

    for impact in impacts {
        if indicator.is_some_and(|code| code != &impact.indicator_code) {
            continue;
        }

        let series = observations
            .iter()
            .filter(|o| o.indicator_code == impact.indicator_code);
        let mut pre: Option<&Observation> = None;
        let mut post: Option<&Observation> = None;
        for obs in series {
            if obs.observation_date < impact.event_date {
                if pre.map_or(true, |p| obs.observation_date >= p.observation_date) {
                    pre = Some(obs);
                }
            } else if obs.observation_date > impact.event_date
                && post.map_or(true, |p| obs.observation_date < p.observation_date)
            {
                post = Some(obs);
            }
        }
        let (Some(pre), Some(post)) = (pre, post) else {
            continue;
        };

        let actual_change = post.value_numeric - pre.value_numeric;
        let predicted_change = impact.impact_magnitude;
        rows.push(ValidationRow {
            event_name: impact.event_name.clone(),
            indicator_code: impact.indicator_code.clone(),
            event_date: impact.event_date,
            pre_value: pre.value_numeric,
            post_value: post.value_numeric,
            actual_change,
            predicted_change,
            error_pp: actual_change - predicted_change,
            error_pct: error_pct(actual_change, predicted_change),
            lag_months: impact.lag_months,
            confidence: impact.confidence.value(),
        });
    }

    let summary = summarize(&rows);
    if let Some(s) = &summary {
        info!(
            count = s.validation_count,
            mae_pp = s.mean_absolute_error_pp,
            mae_pct = s.mean_absolute_error_pct,
            r_squared = ?s.r_squared,
            "validated impacts against history"
        );
    }
    ValidationReport { rows, summary }
}

fn summarize(rows: &[ValidationRow]) -> Option<ValidationSummary> {
    let mean_absolute_error_pp = mean(rows.iter().map(|r| r.error_pp.abs()))?;
    let mean_absolute_error_pct = mean(rows.iter().map(|r| r.error_pct.abs()))?;

    let errors: Vec<f64> = rows.iter().map(|r| r.error_pp).collect();
    let actuals: Vec<f64> = rows.iter().map(|r| r.actual_change).collect();
    let r_squared = match (sample_variance(&errors), sample_variance(&actuals)) {
        (Some(ve), Some(va)) if va > 0.0 => Some((1.0 - ve / va).max(0.0)),
        _ => None,
    };

    Some(ValidationSummary {
        mean_absolute_error_pp,
        mean_absolute_error_pct,
        r_squared,
        validation_count: rows.len(),
    })
}
