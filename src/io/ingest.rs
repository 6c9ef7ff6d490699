//! Benchmark CSV ingest.
//!
//! Two layouts are accepted:
//!
//! - **Run directory**: one CSV per benchmark run. The pipeline depth comes from
//!   a `P<digits>` token in the file name and the client count from an optional
//!   `C<digits>` token. The first data row supplies `rps` and, when present,
//!   `p50_latency_ms`.
//! - **Tidy file**: a single CSV with one run per row and columns
//!   `pipeline_depth`, `rps` (or `throughput`), optional `p50_latency_ms` and
//!   optional `clients`.
//!
//! Design goals:
//! - **File/row-level validation** (skip bad inputs, but report what happened)
//! - **Deterministic behavior** (sorted discovery, no hidden randomness)
//! - **Separation of concerns**: no fitting logic here. Field-level checks
//!   (positive throughput, depth >= 1) happen in `ObservationSet::from_raw`.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{ObservationSet, RawObservation};
use crate::error::{AppError, exit};
use crate::io::discover::{DEFAULT_SEARCH_DEPTH, find_csv_files, validate_data_path};

const MS_PER_S: f64 = 1e3;

/// One loaded benchmark run, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchRecord {
    pub raw: RawObservation,
    /// Client connections stated by the source, if any.
    pub clients: Option<u32>,
}

/// A file- or row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub source: String,
    pub message: String,
}

/// Observations for one concurrency level.
#[derive(Debug, Clone)]
pub struct ConcurrencyGroup {
    pub concurrency: u32,
    pub observations: ObservationSet,
}

/// Ingest output: loader records + errors + counters.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub source: PathBuf,
    pub records: Vec<BenchRecord>,
    pub row_errors: Vec<RowError>,
    pub files_read: usize,
}

impl IngestedData {
    /// Split records by client count (records without one use `default_concurrency`),
    /// validating each group. Groups come back in ascending concurrency order.
    pub fn group_by_concurrency(&self, default_concurrency: u32) -> Vec<ConcurrencyGroup> {
        let mut buckets: BTreeMap<u32, Vec<RawObservation>> = BTreeMap::new();
        for rec in &self.records {
            let c = rec.clients.unwrap_or(default_concurrency);
            buckets.entry(c).or_default().push(rec.raw.clone());
        }
        buckets
            .into_iter()
            .map(|(concurrency, raws)| ConcurrencyGroup {
                concurrency,
                observations: ObservationSet::from_raw(raws),
            })
            .collect()
    }
}

/// Load benchmark runs from a directory of run files or a single tidy CSV.
pub fn load_observations(path: &Path) -> Result<IngestedData, AppError> {
    validate_data_path(path)?;

    let data = if path.is_dir() {
        load_run_directory(path)?
    } else {
        load_tidy_file(path)?
    };

    for e in &data.row_errors {
        warn!(source = %e.source, message = %e.message, "skipped input");
    }
    info!(
        source = %data.source.display(),
        files = data.files_read,
        records = data.records.len(),
        errors = data.row_errors.len(),
        "loaded benchmark data"
    );

    if data.records.is_empty() {
        return Err(AppError::new(
            exit::INSUFFICIENT_DATA,
            format!("No usable benchmark records found in {}.", path.display()),
        ));
    }
    Ok(data)
}

fn load_run_directory(dir: &Path) -> Result<IngestedData, AppError> {
    let files = find_csv_files(dir, DEFAULT_SEARCH_DEPTH);
    if files.is_empty() {
        return Err(AppError::input(format!("No CSV files found in {}", dir.display())));
    }

    let mut records = Vec::with_capacity(files.len());
    let mut row_errors = Vec::new();

    for file in &files {
        let source = file
            .strip_prefix(dir)
            .unwrap_or(file)
            .display()
            .to_string();
        match load_run_file(file, &source) {
            Ok(rec) => records.push(rec),
            Err(message) => row_errors.push(RowError { source, message }),
        }
    }

    Ok(IngestedData {
        source: dir.to_path_buf(),
        records,
        row_errors,
        files_read: files.len(),
    })
}

fn load_run_file(path: &Path, source: &str) -> Result<BenchRecord, String> {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    let (depth, clients) = parse_run_tags(name)?;

    let mut reader = open_reader(path).map_err(|e| e.to_string())?;
    let headers = reader
        .headers()
        .map_err(|e| format!("failed to read CSV headers: {e}"))?
        .clone();
    let header_map = build_header_map(&headers);
    if !header_map.contains_key("rps") {
        return Err("missing `rps` column".to_string());
    }

    let record = reader
        .records()
        .next()
        .ok_or_else(|| "no data rows".to_string())?
        .map_err(|e| format!("CSV parse error: {e}"))?;

    Ok(BenchRecord {
        raw: RawObservation {
            source: source.to_string(),
            pipeline_depth: Some(depth),
            throughput: parse_opt_f64(get_optional(&record, &header_map, "rps")),
            p50_latency: parse_latency_ms(get_optional(&record, &header_map, "p50_latency_ms")),
        },
        clients,
    })
}

fn load_tidy_file(path: &Path) -> Result<IngestedData, AppError> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    if !header_map.contains_key("pipeline_depth") {
        return Err(AppError::input("Missing required column: `pipeline_depth`"));
    }
    let throughput_col = ["rps", "throughput"]
        .into_iter()
        .find(|c| header_map.contains_key(*c))
        .ok_or_else(|| AppError::input("Missing required column: `rps` (or `throughput`)"))?;

    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("input.csv")
        .to_string();

    let mut records = Vec::new();
    let mut row_errors = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header and CSV lines are 1-based.
        let source = format!("{file_name}:{}", idx + 2);
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    source,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let clients = match get_optional(&record, &header_map, "clients") {
            None => None,
            Some(raw) => match parse_client_count(raw) {
                Some(c) => Some(c),
                None => {
                    row_errors.push(RowError {
                        source,
                        message: client_count_error(raw),
                    });
                    continue;
                }
            },
        };

        let depth = get_optional(&record, &header_map, "pipeline_depth");
        let throughput = get_optional(&record, &header_map, throughput_col);
        let latency = get_optional(&record, &header_map, "p50_latency_ms");
        records.push(BenchRecord {
            raw: RawObservation {
                source,
                pipeline_depth: parse_opt_i64(depth),
                throughput: parse_opt_f64(throughput),
                p50_latency: parse_latency_ms(latency),
            },
            clients,
        });
    }

    Ok(IngestedData {
        source: path.to_path_buf(),
        records,
        row_errors,
        files_read: 1,
    })
}

/// Digits following the first `tag` that is immediately followed by a digit.
///
/// `file_tag_digits("bench_C50_P16.csv", 'P') == Some("16")`
pub fn file_tag_digits(name: &str, tag: char) -> Option<&str> {
    let mut rest = name;
    while let Some(pos) = rest.find(tag) {
        let after = &rest[pos + tag.len_utf8()..];
        let end = after
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(after.len());
        if end > 0 {
            return Some(&after[..end]);
        }
        rest = after;
    }
    None
}

/// Pipeline depth and optional client count from a run file name.
fn parse_run_tags(name: &str) -> Result<(i64, Option<u32>), String> {
    let digits = file_tag_digits(name, 'P')
        .ok_or_else(|| "file name carries no `P<depth>` token".to_string())?;
    let depth = digits
        .parse::<i64>()
        .map_err(|_| format!("pipeline depth `P{digits}` is out of range"))?;
    let clients = file_tag_digits(name, 'C')
        .map(|d| parse_client_count(d).ok_or_else(|| client_count_error(&format!("C{d}"))))
        .transpose()?;
    Ok((depth, clients))
}

fn parse_client_count(s: &str) -> Option<u32> {
    s.parse::<u32>().ok().filter(|&c| c > 0)
}

fn client_count_error(raw: &str) -> String {
    format!("client count `{raw}` must be an integer between 1 and {}", u32::MAX)
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::input(format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_optional<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let v = s?.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn parse_opt_i64(s: Option<&str>) -> Option<i64> {
    s?.parse::<i64>().ok()
}

fn parse_latency_ms(s: Option<&str>) -> Option<f64> {
    parse_opt_f64(s).map(|ms| ms / MS_PER_S)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn file_tags_are_parsed() {
        assert_eq!(file_tag_digits("bench_C50_P16.csv", 'P'), Some("16"));
        assert_eq!(file_tag_digits("bench_C50_P16.csv", 'C'), Some("50"));
        assert_eq!(file_tag_digits("Pipeline_P8.csv", 'P'), Some("8"));
        assert_eq!(file_tag_digits("redis_bench.csv", 'P'), None);
        assert_eq!(file_tag_digits("P", 'P'), None);
        assert_eq!(parse_run_tags("bench_C50_P16.csv"), Ok((16, Some(50))));
        assert_eq!(parse_run_tags("bench_P16.csv"), Ok((16, None)));
    }

    #[test]
    fn bad_run_tags_are_reported_precisely() {
        let overflow = parse_run_tags("bench_P99999999999999999999.csv").unwrap_err();
        assert!(overflow.contains("`P99999999999999999999` is out of range"), "{overflow}");

        let zero = parse_run_tags("bench_C0_P4.csv").unwrap_err();
        assert!(zero.contains("client count `C0`"), "{zero}");
        assert!(parse_run_tags("bench_C5000000000_P4.csv").is_err());
    }

    #[test]
    fn zero_client_file_is_a_row_error_not_a_group() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bench_C0_P4.csv"), "rps
200000
").unwrap();
        fs::write(dir.path().join("bench_C50_P1.csv"), "rps
90000
").unwrap();

        let data = load_observations(dir.path()).unwrap();
        assert_eq!(data.records.len(), 1);
        assert_eq!(data.row_errors.len(), 1);
        assert_eq!(data.row_errors[0].source, "bench_C0_P4.csv");

        let groups = data.group_by_concurrency(50);
        assert!(groups.iter().all(|g| g.concurrency > 0));
    }

    #[test]
    fn tidy_rows_with_bad_clients_are_row_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.csv");
        fs::write(
            &path,
            "pipeline_depth,rps,clients\n\
             1,100000,0\n\
             2,150000,many\n\
             4,300000,-3\n\
             8,350000,20\n",
        )
        .unwrap();

        let data = load_observations(&path).unwrap();
        assert_eq!(data.records.len(), 1);
        assert_eq!(data.records[0].clients, Some(20));
        let sources: Vec<&str> = data.row_errors.iter().map(|e| e.source.as_str()).collect();
        assert_eq!(sources, vec!["runs.csv:2", "runs.csv:3", "runs.csv:4"]);
        assert!(data.row_errors[1].message.contains("`many`"));
    }

    #[test]
    fn run_directory_reads_first_row_and_converts_latency() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("bench_C50_P4.csv"),
            "\u{feff}RPS, p50_latency_ms\n200000,0.8\n1,1\n",
        )
        .unwrap();
        fs::write(dir.path().join("bench_C10_P1.csv"), "rps\n90000\n").unwrap();
        fs::write(dir.path().join("no_depth.csv"), "rps\n1\n").unwrap();
        fs::write(dir.path().join("bench_P2.csv"), "qps\n1\n").unwrap();

        let data = load_observations(dir.path()).unwrap();
        assert_eq!(data.files_read, 4);
        assert_eq!(data.records.len(), 2);
        assert_eq!(data.row_errors.len(), 2);

        // Sorted discovery: C10_P1 before C50_P4.
        let first = &data.records[0];
        assert_eq!(first.clients, Some(10));
        assert_eq!(first.raw.pipeline_depth, Some(1));
        assert_eq!(first.raw.p50_latency, None);

        let second = &data.records[1];
        assert_eq!(second.raw.throughput, Some(200000.0));
        assert!((second.raw.p50_latency.unwrap() - 0.0008).abs() < 1e-15);

        let groups = data.group_by_concurrency(50);
        let cs: Vec<u32> = groups.iter().map(|g| g.concurrency).collect();
        assert_eq!(cs, vec![10, 50]);
    }

    #[test]
    fn tidy_file_routes_bad_rows_to_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.csv");
        fs::write(
            &path,
            "pipeline_depth,throughput,p50_latency_ms,clients\n\
             1,100000,0.5,\n\
             2,,0.5,\n\
             x,100000,,\n\
             4,300000,,20\n",
        )
        .unwrap();

        let data = load_observations(&path).unwrap();
        assert_eq!(data.records.len(), 4);
        assert!(data.row_errors.is_empty());

        let groups = data.group_by_concurrency(50);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].concurrency, 20);
        assert_eq!(groups[0].observations.len(), 1);
        let c50 = &groups[1].observations;
        assert_eq!(c50.len(), 1);
        assert_eq!(c50.skipped().len(), 2);
        assert_eq!(c50.skipped()[0].source, "runs.csv:3");
    }

    #[test]
    fn tidy_file_without_depth_column_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.csv");
        fs::write(&path, "rps\n1\n").unwrap();
        let err = load_observations(&path).unwrap_err();
        assert_eq!(err.exit_code(), exit::INPUT);
    }

    #[test]
    fn directory_without_usable_runs_is_insufficient() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.csv"), "rps\n1\n").unwrap();
        let err = load_observations(dir.path()).unwrap_err();
        assert_eq!(err.exit_code(), exit::INSUFFICIENT_DATA);
    }
}
