//! Read/write analysis report JSON.
//!
//! The report JSON is the portable representation of a run: per-group fit
//! parameters in raw and paper units, derived metrics, invariant verdicts and
//! the observations that were fitted. `tput plot --results` renders from it
//! without re-reading the benchmark data.

use std::fs::File;
use std::path::Path;

use crate::error::AppError;
use crate::report::AnalysisReport;

/// Write the report as pretty-printed JSON.
pub fn write_report_json(path: &Path, report: &AnalysisReport) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::input(format!("Failed to create report JSON '{}': {e}", path.display()))
    })?;

    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::input(format!("Failed to write report JSON: {e}")))?;

    Ok(())
}

/// Read a report JSON file.
pub fn read_report_json(path: &Path) -> Result<AnalysisReport, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::input(format!("Failed to open report JSON '{}': {e}", path.display()))
    })?;
    let report: AnalysisReport = serde_json::from_reader(file)
        .map_err(|e| AppError::input(format!("Invalid report JSON: {e}")))?;
    Ok(report)
}
