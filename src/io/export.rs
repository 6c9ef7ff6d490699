//! CSV writers.
//!
//! - the fitted-values table (`write_fitted_csv`), one row per observation,
//!   easy to consume in spreadsheets or downstream scripts
//! - a benchmark run directory (`write_bench_directory`) in the same layout the
//!   loader reads, used by `tput simulate`

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::Observation;
use crate::error::AppError;
use crate::report::ObservationResidual;

const MS_PER_S: f64 = 1e3;

/// Write per-observation fitted values and residuals to a CSV file, one block
/// of rows per concurrency group.
pub fn write_fitted_csv(
    path: &Path,
    groups: &[(u32, Vec<ObservationResidual>)],
) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::input(format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;

    writeln!(
        file,
        "concurrency,pipeline_depth,throughput_obs,throughput_fit,\
         y_obs,y_fit,residual,p50_latency_ms"
    )
    .map_err(|e| AppError::input(format!("Failed to write export CSV header: {e}")))?;

    for (concurrency, rows) in groups {
        for r in rows {
            let o = &r.observation;
            writeln!(
                file,
                "{},{},{:.3},{},{:.12e},{:.12e},{},{}",
                concurrency,
                o.pipeline_depth,
                o.throughput,
                finite_or_empty(r.throughput_fit, 3),
                r.y_obs,
                r.y_fit,
                finite_or_empty(r.residual, 3),
                o.p50_latency
                    .map(|l| format!("{:.6}", l * MS_PER_S))
                    .unwrap_or_default(),
            )
            .map_err(|e| AppError::input(format!("Failed to write export CSV row: {e}")))?;
        }
    }

    Ok(())
}

/// Write one `bench_C{c}_P{p}.csv` file per observation into `dir`.
///
/// Returns the written paths in depth order.
pub fn write_bench_directory(
    dir: &Path,
    concurrency: u32,
    observations: &[Observation],
) -> Result<Vec<PathBuf>, AppError> {
    fs::create_dir_all(dir).map_err(|e| {
        AppError::input(format!("Failed to create directory '{}': {e}", dir.display()))
    })?;

    let mut written = Vec::with_capacity(observations.len());
    for o in observations {
        let path = dir.join(format!("bench_C{concurrency}_P{}.csv", o.pipeline_depth));
        let mut file = File::create(&path)
            .map_err(|e| AppError::input(format!("Failed to create '{}': {e}", path.display())))?;

        let row = match o.p50_latency {
            Some(l) => format!("rps,p50_latency_ms\n{:.3},{:.6}\n", o.throughput, l * MS_PER_S),
            None => format!("rps\n{:.3}\n", o.throughput),
        };
        file.write_all(row.as_bytes())
            .map_err(|e| AppError::input(format!("Failed to write '{}': {e}", path.display())))?;
        written.push(path);
    }

    Ok(written)
}

fn finite_or_empty(v: f64, prec: usize) -> String {
    if v.is_finite() {
        format!("{v:.prec$}")
    } else {
        String::new()
    }
}
