//! Output artifacts.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::FiResult;
use crate::forecast::ForecastRow;
use crate::impact::{EventImpact, ImpactMatrix};
use crate::pipeline::PipelineReport;
use crate::time::YearRange;

/// Association matrix, one row per event.
pub const MATRIX_FILE: &str = "impact_matrix.csv";
/// Estimated impacts as a JSON array.
pub const IMPACTS_FILE: &str = "event_impacts.json";
/// The full run report.
pub const REPORT_FILE: &str = "run_report.json";

/// `forecasts_<start>_<end>.csv`
#[must_use]
pub fn forecast_file_name(window: YearRange) -> String {
    format!("forecasts_{}_{}.csv", window.start, window.end)
}

/// Writes the matrix as CSV: an `event` column, then one column per
/// indicator. Empty cells are blank.
///
/// # Errors
///
/// Returns `FiError::Csv` or `FiError::Io` if writing fails.
pub fn write_matrix_csv<W: Write>(matrix: &ImpactMatrix, writer: W) -> FiResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    let header: Vec<&str> = std::iter::once("event")
        .chain(matrix.indicators().iter().map(|c| c.as_str()))
        .collect();
    csv.write_record(&header)?;
    for (event, cells) in matrix.rows() {
        let mut record = Vec::with_capacity(cells.len() + 1);
        record.push(event.to_string());
        record.extend(cells.iter().map(|c| c.as_ref().map(ToString::to_string).unwrap_or_default()));
        csv.write_record(&record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes the forecast table as CSV.
///
/// # Errors
///
/// Returns `FiError::Csv` or `FiError::Io` if writing fails.
pub fn write_forecast_csv<W: Write>(rows: &[ForecastRow], writer: W) -> FiResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

fn write_json<T: Serialize + ?Sized, W: Write>(value: &T, writer: W) -> FiResult<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Writes impacts as pretty JSON.
///
/// # Errors
///
/// Returns `FiError::Json` or `FiError::Io` if writing fails.
pub fn write_impacts_json<W: Write>(impacts: &[EventImpact], writer: W) -> FiResult<()> {
    write_json(impacts, writer)
}

/// Writes the full run report as pretty JSON.
///
/// # Errors
///
/// Returns `FiError::Json` or `FiError::Io` if writing fails.
pub fn write_report_json<W: Write>(report: &PipelineReport, writer: W) -> FiResult<()> {
    write_json(report, writer)
}

/// Writes every artifact into `dir`, creating it if needed, and returns the
/// paths written.
///
/// # Errors
///
/// Returns the first I/O or encoding error.
pub fn write_all(report: &PipelineReport, dir: impl AsRef<Path>) -> FiResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let matrix = dir.join(MATRIX_FILE);
    write_matrix_csv(&report.matrix, File::create(&matrix)?)?;
    let impacts = dir.join(IMPACTS_FILE);
    write_impacts_json(&report.impacts, File::create(&impacts)?)?;
    let forecasts = dir.join(forecast_file_name(report.config.forecast_window));
    write_forecast_csv(&report.forecast_rows(), File::create(&forecasts)?)?;
    let summary = dir.join(REPORT_FILE);
    write_report_json(report, File::create(&summary)?)?;

    let written = vec![matrix, impacts, forecasts, summary];
    info!(dir = %dir.display(), files = written.len(), "artifacts written");
    Ok(written)
}
