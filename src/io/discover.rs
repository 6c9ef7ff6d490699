//! Benchmark file discovery.
//!
//! A benchmark directory holds one CSV per run. We walk it recursively (to a
//! bounded depth) and return the files in a deterministic order so that the
//! observation sequence, and therefore the fit, is reproducible.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Default directory recursion depth for finding CSV files.
pub const DEFAULT_SEARCH_DEPTH: usize = 4;

/// Validate that `path` exists and is either a directory or a `.csv` file.
pub fn validate_data_path(path: &Path) -> Result<(), AppError> {
    if !path.exists() {
        return Err(AppError::input(format!(
            "Benchmark data not found: {}",
            path.display()
        )));
    }
    if path.is_file() && !is_csv(path) {
        return Err(AppError::input(format!(
            "Expected a directory or a .csv file (got: {}).",
            path.display()
        )));
    }
    Ok(())
}

/// Find `*.csv` files under `root`, sorted by path.
pub fn find_csv_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut out = Vec::new();
    find_csv_files_inner(root, 0, max_depth, &mut out);
    out.sort();
    out
}

fn find_csv_files_inner(root: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }

    let Ok(entries) = fs::read_dir(root) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };

        if file_type.is_dir() {
            if should_skip_dir(&path) {
                continue;
            }
            find_csv_files_inner(&path, depth + 1, max_depth, out);
            continue;
        }

        if file_type.is_file() && is_csv(&path) {
            out.push(path);
        }
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        == Some(true)
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    name.starts_with('.') || matches!(name, "target" | "node_modules")
}
