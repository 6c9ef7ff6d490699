//! Command-line parsing for the throughput-model tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting/invariant code.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::data::DEFAULT_DEPTHS;
use crate::domain::{
    DEFAULT_CONCURRENCY, DEFAULT_CONFIDENCE, DEFAULT_CPU_GHZ, RECOMMENDED_MIN_POINTS,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "tput",
    version,
    about = "Batched-service throughput model: fit T(p) = p / (t0 + t1 p) and check invariants"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the model, derive metrics, run invariant checks, then print, plot and export.
    Analyze(AnalyzeArgs),
    /// Print the fit and derived metrics only.
    Fit(AnalyzeArgs),
    /// Print invariant verdicts only (exits non-zero when any check fails).
    Validate(AnalyzeArgs),
    /// Write a synthetic benchmark directory drawn from the model.
    Simulate(SimulateArgs),
    /// Plot a previously exported report JSON.
    Plot(PlotArgs),
}

/// Options shared by `analyze`, `fit` and `validate`.
#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// Benchmark directory (one CSV per run) or a single tidy CSV.
    #[arg(short = 'd', long, env = "TPUT_DATA", default_value = "data/bench")]
    pub data: PathBuf,

    /// Client connections assumed for runs that do not state their own.
    #[arg(
        short = 'c',
        long,
        env = "TPUT_CONCURRENCY",
        default_value_t = DEFAULT_CONCURRENCY,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub concurrency: u32,

    /// Only analyse the group with this client count.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub clients: Option<u32>,

    /// Clock frequency (GHz) for the cycles-per-op estimate.
    #[arg(
        long,
        env = "TPUT_CPU_GHZ",
        default_value_t = DEFAULT_CPU_GHZ,
        value_parser = parse_positive_ghz
    )]
    pub cpu_ghz: f64,

    /// Two-sided confidence level for parameter intervals.
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    pub confidence: f64,

    /// Recommended minimum number of observations per group.
    #[arg(long, default_value_t = RECOMMENDED_MIN_POINTS)]
    pub min_points: usize,

    /// Warn instead of failing below `--min-points`.
    #[arg(long)]
    pub allow_sparse: bool,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the full report to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Export per-observation fitted values to CSV.
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,
}

/// Options for generating a synthetic benchmark directory.
#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// Output directory (created if missing).
    #[arg(short = 'o', long, default_value = "data/bench")]
    pub out: PathBuf,

    /// Fixed cost per batch (microseconds).
    #[arg(long = "t0-us", default_value_t = 12.0)]
    pub t0_us: f64,

    /// Marginal cost per operation (nanoseconds).
    #[arg(long = "t1-ns", default_value_t = 70.0)]
    pub t1_ns: f64,

    /// Pipeline depths to simulate (comma separated).
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_DEPTHS)]
    pub depths: Vec<u32>,

    /// Client connections.
    #[arg(
        short = 'c',
        long,
        default_value_t = DEFAULT_CONCURRENCY,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub concurrency: u32,

    /// Standard deviation of log-throughput noise.
    #[arg(long, default_value_t = 0.02)]
    pub noise: f64,

    /// Fraction of the closure bound used by generated latencies.
    #[arg(long, default_value_t = 0.9)]
    pub utilization: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options for plotting a saved report.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Report JSON produced by `tput analyze --export-json`.
    #[arg(long, value_name = "JSON")]
    pub results: PathBuf,

    /// Only plot the group with this client count.
    #[arg(long)]
    pub clients: Option<u32>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

fn parse_positive_ghz(s: &str) -> Result<f64, String> {
    let ghz: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if ghz.is_finite() && ghz > 0.0 {
        Ok(ghz)
    } else {
        Err(format!("`{s}` is not a positive, finite frequency"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_defaults_and_flags() {
        let cli = Cli::try_parse_from([
            "tput", "analyze", "--data", "runs.csv", "--clients", "10", "--allow-sparse", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.data, PathBuf::from("runs.csv"));
        assert_eq!(args.clients, Some(10));
        assert!(args.allow_sparse);
        assert_eq!(args.min_points, 5);
        assert_eq!(args.confidence, 0.95);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(Cli::try_parse_from(["tput", "fit", "--concurrency", "0"]).is_err());
    }

    #[test]
    fn cpu_frequency_must_be_positive_and_finite() {
        for bad in ["0", "-3.5", "NaN", "inf"] {
            let parsed = Cli::try_parse_from(["tput", "fit", "--cpu-ghz", bad]);
            assert!(parsed.is_err(), "accepted --cpu-ghz {bad}");
        }
        let cli = Cli::try_parse_from(["tput", "fit", "--cpu-ghz", "2.4"]).unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.cpu_ghz, 2.4);
    }

    #[test]
    fn simulate_parses_depth_list() {
        let cli = Cli::try_parse_from(["tput", "simulate", "--depths", "1,4,16", "--seed", "7"])
            .unwrap();
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.depths, vec![1, 4, 16]);
        assert_eq!(args.seed, 7);
    }
}
