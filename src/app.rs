//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments (after loading `.env`)
//! - runs the analysis pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{AnalyzeArgs, Cli, Command, PlotArgs, SimulateArgs};
use crate::data::{SyntheticSpec, generate_observations};
use crate::domain::AnalysisConfig;
use crate::error::{AppError, exit};
use crate::io::{read_report_json, write_bench_directory, write_fitted_csv, write_report_json};
use crate::models::{NS_PER_S, US_PER_S};
use crate::plot::{
    render_closure_plot, render_linearized_plot, render_syscall_plot, render_throughput_plot,
};
use crate::report::{
    GroupReport, compute_residuals, format_group_fit, format_invariants, format_residuals,
    format_run_header, format_run_summary,
};

pub mod pipeline;

/// Load `.env` and parse argv.
///
/// We want `tput` and `tput --data runs/` to behave like `tput analyze ...`.
/// Clap requires a subcommand name, so we do a small, explicit rewrite of the
/// argv list before parsing.
pub fn parse_cli() -> Cli {
    dotenvy::dotenv().ok();
    let argv = rewrite_args(std::env::args().collect());
    Cli::parse_from(argv)
}

/// Dispatch a parsed command.
pub fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Analyze(args) => handle_analysis(args, OutputMode::Full),
        Command::Fit(args) => handle_analysis(args, OutputMode::FitOnly),
        Command::Validate(args) => handle_analysis(args, OutputMode::ValidateOnly),
        Command::Simulate(args) => handle_simulate(args),
        Command::Plot(args) => handle_plot(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    FitOnly,
    ValidateOnly,
}

fn handle_analysis(args: AnalyzeArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args);
    let run = pipeline::run_analysis(&config)?;
    let report = &run.report;

    match mode {
        OutputMode::FitOnly => print!("{}", format_run_summary(report)),
        OutputMode::Full => {
            print!("{}", format_run_header(report));
            for (group, analysis) in report.groups.iter().zip(&run.groups) {
                println!();
                print!("{}", format_group_fit(group));
                print!("{}", format_invariants(&group.invariants));
                if let Ok(outcome) = &analysis.outcome {
                    let observations = analysis.observations.observations();
                    let rows = compute_residuals(observations, &outcome.point());
                    println!();
                    print!("{}", format_residuals(&rows));
                }
                if config.plot {
                    println!();
                    let (w, h) = (config.plot_width, config.plot_height);
                    print!("{}", render_group_plots(group, w, h));
                }
            }
        }
        OutputMode::ValidateOnly => {
            for group in &report.groups {
                println!("--- C={} ---", group.concurrency);
                print!("{}", format_invariants(&group.invariants));
            }
        }
    }

    if let Some(path) = &config.export_json {
        write_report_json(path, report)?;
        info!(path = %path.display(), "wrote report JSON");
    }
    if let Some(path) = &config.export_csv {
        let groups: Vec<(u32, Vec<_>)> = run
            .groups
            .iter()
            .filter_map(|g| {
                let outcome = g.outcome.as_ref().ok()?;
                Some((
                    g.concurrency,
                    compute_residuals(g.observations.observations(), &outcome.point()),
                ))
            })
            .collect();
        write_fitted_csv(path, &groups)?;
        info!(path = %path.display(), "wrote fitted CSV");
    }

    if mode == OutputMode::ValidateOnly && !report.all_passed() {
        return Err(AppError::new(exit::INVARIANT, "One or more invariant checks failed."));
    }
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let spec = SyntheticSpec {
        t0: args.t0_us / US_PER_S,
        t1: args.t1_ns / NS_PER_S,
        depths: args.depths,
        concurrency: args.concurrency,
        noise_rel: args.noise,
        utilization: args.utilization,
        seed: args.seed,
    };
    let observations = generate_observations(&spec)?;
    let written = write_bench_directory(&args.out, spec.concurrency, &observations)?;
    println!("Wrote {} benchmark files to {}", written.len(), args.out.display());
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let report = read_report_json(&args.results)?;

    let groups: Vec<&GroupReport> = report
        .groups
        .iter()
        .filter(|g| args.clients.is_none_or(|c| g.concurrency == c))
        .collect();
    if groups.is_empty() {
        return Err(AppError::input(format!(
            "No matching groups in {}.",
            args.results.display()
        )));
    }

    for group in groups {
        println!("--- C={} ---", group.concurrency);
        print!("{}", render_group_plots(group, args.width, args.height));
    }
    Ok(())
}

fn render_group_plots(group: &GroupReport, width: usize, height: usize) -> String {
    let fit = group.fit.point();
    let mut out = render_throughput_plot(&group.observations, fit.as_ref(), width, height);
    out.push('\n');
    out.push_str(&render_linearized_plot(&group.observations, fit.as_ref(), width, height));
    out.push('\n');
    out.push_str(&render_closure_plot(group.closure_points(), width, height));
    if let Some((concurrency, points)) = group.syscall_curve() {
        out.push('\n');
        out.push_str(&render_syscall_plot(points, concurrency, width, height));
    }
    out
}

pub fn analysis_config_from_args(args: &AnalyzeArgs) -> AnalysisConfig {
    AnalysisConfig {
        data_path: args.data.clone(),
        concurrency: args.concurrency,
        clients_filter: args.clients,
        cpu_ghz: args.cpu_ghz,
        confidence: args.confidence,
        min_points: args.min_points,
        allow_sparse: args.allow_sparse,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_json: args.export_json.clone(),
        export_csv: args.export_csv.clone(),
    }
}

/// Rewrite argv so `tput` defaults to `tput analyze`.
///
/// Rules:
/// - `tput`                       -> `tput analyze`
/// - `tput --data X ...`          -> `tput analyze --data X ...`
/// - `tput --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("analyze".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "analyze" | "fit" | "validate" | "simulate" | "plot"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "analyze flags".
    if arg1.starts_with('-') {
        argv.insert(1, "analyze".to_string());
        return argv;
    }

    argv
}
