//! Per-indicator forecasting, optionally spread over a bounded worker pool.
//!
//! Indicators are independent, so each job owns one slot in the output and
//! results come back in request order regardless of which worker ran them.

use std::thread;

use crossbeam_channel::bounded;
use tracing::{debug, warn};

use crate::error::{FiError, FiResult};
use crate::forecast::{IndicatorForecast, ScenarioForecaster};
use crate::impact::EventImpact;
use crate::indicator::IndicatorCode;
use crate::record::Observation;

/// Forecast result for one requested indicator.
#[derive(Debug)]
pub struct IndicatorOutcome {
    /// Indicator requested.
    pub indicator_code: IndicatorCode,
    /// Its forecast, or why it could not be produced.
    pub result: FiResult<IndicatorForecast>,
}

/// Forecasts every indicator in `indicators`, in order.
///
/// A failure for one indicator (typically `MissingData`) is reported in its
/// outcome and does not affect the others. With `workers <= 1` everything
/// runs on the calling thread.
///
/// # Errors
///
/// Returns `FiError::Io` if a worker thread cannot be spawned, or
/// `FiError::Internal` if a worker dies before reporting.
pub fn forecast_indicators(
    forecaster: &ScenarioForecaster,
    indicators: &[IndicatorCode],
    observations: &[Observation],
    impacts: &[EventImpact],
    workers: usize,
) -> FiResult<Vec<IndicatorOutcome>> {
    let run = |code: &IndicatorCode| IndicatorOutcome {
        indicator_code: code.clone(),
        result: forecaster.forecast_all_scenarios(code, observations, impacts),
    };

    let workers = workers.min(indicators.len());
    if workers <= 1 {
        return Ok(indicators.iter().map(run).collect());
    }

    debug!(workers, jobs = indicators.len(), "forecasting on worker pool");
    let (job_tx, job_rx) = bounded::<usize>(indicators.len());
    let (out_tx, out_rx) = bounded::<(usize, IndicatorOutcome)>(indicators.len());
    for idx in 0..indicators.len() {
        job_tx
            .send(idx)
            .map_err(|_| FiError::internal("forecast job queue closed early"))?;
    }
    drop(job_tx);

    let mut slots: Vec<Option<IndicatorOutcome>> = indicators.iter().map(|_| None).collect();
    thread::scope(|scope| -> FiResult<()> {
        for i in 0..workers {
            let job_rx = job_rx.clone();
            let out_tx = out_tx.clone();
            let run = &run;
            thread::Builder::new()
                .name(format!("fi-forecast-{i}"))
                .spawn_scoped(scope, move || {
                    while let Ok(idx) = job_rx.recv() {
                        if out_tx.send((idx, run(&indicators[idx]))).is_err() {
                            break;
                        }
                    }
                })?;
        }
        drop(out_tx);

        for (idx, outcome) in out_rx.iter() {
            slots[idx] = Some(outcome);
        }
        Ok(())
    })?;

    slots
        .into_iter()
        .zip(indicators)
        .map(|(slot, code)| {
            slot.ok_or_else(|| {
                warn!(indicator = %code, "forecast worker exited without a result");
                FiError::internal(format!("no forecast result for {code}"))
            })
        })
        .collect()
}
