//! Per-indicator linear trend.
//!
//! The trend is an ordinary least-squares fit of value on calendar year over
//! a fixed history window, one value per year. Years without an observation
//! are gaps; they are not interpolated.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FiError, FiResult};
use crate::indicator::IndicatorCode;
use crate::record::Observation;
use crate::time::YearRange;

/// A fitted linear trend for one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendFit {
    /// Indicator fitted.
    pub indicator_code: IndicatorCode,
    /// Change per year.
    pub slope: f64,
    /// Value at year zero.
    pub intercept: f64,
    /// Population standard deviation of in-sample residuals.
    pub residual_std_error: f64,
    /// In-sample coefficient of determination.
    pub r_squared: f64,
    /// Every year of the history window.
    pub years: Vec<i32>,
    /// Observed value per window year, `None` for gaps.
    pub actual: Vec<Option<f64>>,
    /// Trend value per window year.
    pub fitted: Vec<f64>,
    /// Latest window year with data.
    pub last_observed_year: i32,
    /// Value observed in `last_observed_year`.
    pub last_observed_value: f64,
}

impl TrendFit {
    /// Trend value at `year`.
    #[must_use]
    pub fn predict(&self, year: i32) -> f64 {
        self.intercept + self.slope * f64::from(year)
    }

    /// (year, value) pairs that actually had data.
    pub fn observed(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.years
            .iter()
            .zip(&self.actual)
            .filter_map(|(&y, v)| v.map(|v| (y, v)))
    }

    /// Most recent non-gap (year, value); the anchor for forecasting.
    #[must_use]
    pub fn last_observed(&self) -> (i32, f64) {
        (self.last_observed_year, self.last_observed_value)
    }
}

/// Fits [`TrendFit`]s over a fixed history window.
#[derive(Debug, Clone, Copy)]
pub struct TrendEstimator {
    window: YearRange,
}

impl TrendEstimator {
    /// Creates an estimator over the history `window`.
    #[must_use]
    pub const fn new(window: YearRange) -> Self {
        Self { window }
    }

    /// History window.
    #[must_use]
    pub const fn window(&self) -> YearRange {
        self.window
    }

    /// One value per window year for `indicator`; on duplicate years the
    /// latest-dated record wins (input order breaks exact ties).
    #[must_use]
    pub fn yearly_series(&self, indicator: &IndicatorCode, observations: &[Observation]) -> BTreeMap<i32, f64> {
        let mut latest: BTreeMap<i32, (NaiveDate, f64)> = BTreeMap::new();
        for obs in observations.iter().filter(|o| &o.indicator_code == indicator) {
            let year = obs.year();
            if !self.window.contains(year) || !obs.value_numeric.is_finite() {
                continue;
            }
            match latest.get(&year) {
                Some((date, _)) if *date > obs.observation_date => {}
                _ => {
                    latest.insert(year, (obs.observation_date, obs.value_numeric));
                }
            }
        }
        latest.into_iter().map(|(y, (_, v))| (y, v)).collect()
    }

    /// Fits the trend for `indicator`.
    ///
    /// # Errors
    ///
    /// Returns `FiError::MissingData` when fewer than two distinct years in
    /// the window have data.
    pub fn fit(&self, indicator: &IndicatorCode, observations: &[Observation]) -> FiResult<TrendFit> {
        let series = self.yearly_series(indicator, observations);
        if series.len() < 2 {
            return Err(FiError::MissingData {
                indicator: indicator.to_string(),
                distinct_years: series.len(),
            });
        }

        let n = series.len() as f64;
        let x_mean = series.keys().map(|&y| f64::from(y)).sum::<f64>() / n;
        let y_mean = series.values().sum::<f64>() / n;
        let (sxy, sxx) = series.iter().fold((0.0, 0.0), |(sxy, sxx), (&year, &value)| {
            let dx = f64::from(year) - x_mean;
            (sxy + dx * (value - y_mean), sxx + dx * dx)
        });
        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;

        let residuals: Vec<f64> = series
            .iter()
            .map(|(&year, &value)| value - (intercept + slope * f64::from(year)))
            .collect();
        let r_mean = residuals.iter().sum::<f64>() / n;
        let ss_res: f64 = residuals.iter().map(|r| r * r).sum();
        let residual_std_error = (residuals.iter().map(|r| (r - r_mean).powi(2)).sum::<f64>() / n).sqrt();
        let ss_tot: f64 = series.values().map(|v| (v - y_mean).powi(2)).sum();
        let r_squared = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res <= f64::EPSILON {
            1.0
        } else {
            0.0
        };

        let years: Vec<i32> = self.window.years().collect();
        let actual: Vec<Option<f64>> = years.iter().map(|y| series.get(y).copied()).collect();
        let fitted: Vec<f64> = years.iter().map(|&y| intercept + slope * f64::from(y)).collect();
        let (&last_observed_year, &last_observed_value) = series
            .iter()
            .next_back()
            .ok_or_else(|| FiError::internal("non-empty series has no last element"))?;

        debug!(
            indicator = %indicator,
            slope,
            intercept,
            residual_std_error,
            r_squared,
            points = series.len(),
            "fitted trend"
        );

        Ok(TrendFit {
            indicator_code: indicator.clone(),
            slope,
            intercept,
            residual_std_error,
            r_squared,
            years,
            actual,
            fitted,
            last_observed_year,
            last_observed_value,
        })
    }
}
