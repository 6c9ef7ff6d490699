//! Shared analysis pipeline used by `analyze`, `fit` and `validate`.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> group by concurrency -> fit -> derived metrics -> invariants -> report
//!
//! Each concurrency group is analysed by `analyze_group`, a pure function over
//! an immutable `ObservationSet`, so groups run in parallel on rayon.

use chrono::Utc;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::{AnalysisConfig, DerivedMetrics, InvariantReport, ObservationSet};
use crate::error::{AppError, FitError, exit};
use crate::fit::{FitOptions, FitOutcome, MinPointsPolicy, derive_metrics, fit_with_fallback};
use crate::invariants::{InvariantConfig, InvariantInputs, check_all};
use crate::io::ingest::{ConcurrencyGroup, IngestedData, load_observations};
use crate::report::{AnalysisReport, assemble_report};

/// Everything computed for one concurrency group.
#[derive(Debug, Clone)]
pub struct GroupAnalysis {
    pub concurrency: u32,
    pub observations: ObservationSet,
    pub outcome: Result<FitOutcome, FitError>,
    pub derived: Option<DerivedMetrics>,
    pub invariants: Vec<InvariantReport>,
}

/// All computed outputs of a single analysis run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub groups: Vec<GroupAnalysis>,
    pub report: AnalysisReport,
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_analysis(config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    validate_config(config)?;
    let ingest = load_observations(&config.data_path)?;
    let groups = select_groups(
        ingest.group_by_concurrency(config.concurrency),
        config.clients_filter,
    )?;

    let opts = fit_options(config);
    let analyses: Vec<GroupAnalysis> = groups
        .into_par_iter()
        .map(|g| analyze_group(g, &opts, config.cpu_ghz))
        .collect();

    // One group failing is reported; all groups failing is an error.
    if analyses.iter().all(|g| g.outcome.is_err()) {
        if let Some(Err(err)) = analyses.first().map(|g| &g.outcome) {
            return Err(err.clone().into());
        }
    }

    let report = assemble_report(
        &ingest.source.display().to_string(),
        &ingest.row_errors,
        &analyses,
        Utc::now(),
    );
    Ok(RunOutput {
        ingest,
        groups: analyses,
        report,
    })
}

/// Fit, derive and check one group.
pub fn analyze_group(group: ConcurrencyGroup, opts: &FitOptions, cpu_ghz: f64) -> GroupAnalysis {
    let ConcurrencyGroup {
        concurrency,
        observations,
    } = group;

    let outcome = fit_with_fallback(observations.observations(), opts);
    let point = outcome.as_ref().ok().map(FitOutcome::point);
    let derived = point.map(|p| derive_metrics(p.t0, p.t1));

    let depths = observations.distinct_depths();
    let invariants = check_all(
        &InvariantInputs {
            observations: observations.observations(),
            depths: &depths,
            t1: point.map(|p| p.t1),
        },
        &InvariantConfig {
            concurrency,
            cpu_ghz,
        },
    );

    match &outcome {
        Ok(o) => {
            let p = o.point();
            info!(
                concurrency,
                n = observations.len(),
                t0 = p.t0,
                t1 = p.t1,
                r_squared = p.r_squared,
                "group fitted"
            );
        }
        Err(e) => warn!(concurrency, error = %e, "group could not be fitted"),
    }

    GroupAnalysis {
        concurrency,
        observations,
        outcome,
        derived,
        invariants,
    }
}

pub fn fit_options(config: &AnalysisConfig) -> FitOptions {
    FitOptions {
        confidence_level: config.confidence,
        min_points: config.min_points,
        min_points_policy: if config.allow_sparse {
            MinPointsPolicy::Warn
        } else {
            MinPointsPolicy::Enforce
        },
    }
}

/// Reject settings that would make every check meaningless.
fn validate_config(config: &AnalysisConfig) -> Result<(), AppError> {
    if !(config.cpu_ghz.is_finite() && config.cpu_ghz > 0.0) {
        return Err(AppError::input(format!(
            "CPU frequency must be positive and finite (got {} GHz).",
            config.cpu_ghz
        )));
    }
    if config.concurrency == 0 {
        return Err(AppError::input("Default concurrency must be at least 1."));
    }
    Ok(())
}

fn select_groups(
    groups: Vec<ConcurrencyGroup>,
    clients: Option<u32>,
) -> Result<Vec<ConcurrencyGroup>, AppError> {
    let Some(c) = clients else {
        return Ok(groups);
    };
    let available: Vec<String> = groups.iter().map(|g| g.concurrency.to_string()).collect();
    let selected: Vec<ConcurrencyGroup> =
        groups.into_iter().filter(|g| g.concurrency == c).collect();
    if selected.is_empty() {
        return Err(AppError::new(
            exit::INSUFFICIENT_DATA,
            format!(
                "No runs with {c} clients (available: {}).",
                available.join(", ")
            ),
        ));
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EvidenceBasis, InvariantKind, Observation};
    use crate::models::predict_throughput;
    use std::fs;

    fn exact_group(concurrency: u32, depths: &[u32]) -> ConcurrencyGroup {
        let (t0, t1) = (12e-6, 70e-9);
        let obs = depths
            .iter()
            .map(|&p| {
                let t = predict_throughput(p as f64, t0, t1);
                Observation::new(p, t).with_latency(0.5 * concurrency as f64 * p as f64 / t)
            })
            .collect();
        ConcurrencyGroup {
            concurrency,
            observations: ObservationSet::from_observations(obs),
        }
    }

    #[test]
    fn group_analysis_fits_and_checks() {
        let group = exact_group(50, &[1, 2, 4, 8, 16, 32]);
        let g = analyze_group(group, &FitOptions::default(), 3.5);
        let fit = g.outcome.as_ref().unwrap().full().unwrap();
        assert!((fit.t1 - 70e-9).abs() < 1e-15);
        assert!(g.derived.unwrap().t_max.is_defined());

        let kinds: Vec<InvariantKind> = g.invariants.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, InvariantKind::ALL.to_vec());
        assert!(g.invariants.iter().all(|r| r.passed));
        assert_eq!(g.invariants[1].basis, EvidenceBasis::Theoretical);
    }

    #[test]
    fn failed_fit_still_runs_invariants() {
        let g = analyze_group(exact_group(50, &[4, 4, 4]), &FitOptions::default(), 3.5);
        assert!(matches!(g.outcome, Err(FitError::InsufficientData { .. })));
        assert!(g.derived.is_none());
        assert_eq!(g.invariants.len(), 3);
        assert!(g.invariants[0].passed);
    }

    #[test]
    fn clients_filter_selects_one_group() {
        let groups = vec![exact_group(10, &[1, 2]), exact_group(50, &[1, 2])];
        let selected = select_groups(groups.clone(), Some(50)).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].concurrency, 50);

        let err = select_groups(groups, Some(7)).unwrap_err();
        assert_eq!(err.exit_code(), exit::INSUFFICIENT_DATA);
        assert!(err.to_string().contains("10, 50"));
    }

    #[test]
    fn run_fails_only_when_every_group_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.csv");
        let mut csv = String::from("pipeline_depth,rps,clients\n");
        for p in [1, 2, 4, 8, 16] {
            csv.push_str(&format!("{p},{},50\n", predict_throughput(p as f64, 12e-6, 70e-9)));
        }
        csv.push_str("1,90000,10\n");
        fs::write(&path, csv).unwrap();

        let config = AnalysisConfig {
            data_path: path.clone(),
            ..AnalysisConfig::default()
        };
        let run = run_analysis(&config).unwrap();
        assert_eq!(run.groups.len(), 2);
        assert!(run.groups[0].outcome.is_err());
        assert!(run.groups[1].outcome.is_ok());

        let only_c10 = AnalysisConfig {
            clients_filter: Some(10),
            ..config
        };
        let err = run_analysis(&only_c10).unwrap_err();
        assert_eq!(err.exit_code(), exit::INSUFFICIENT_DATA);
    }

    #[test]
    fn unusable_cpu_frequency_is_an_input_error() {
        for cpu_ghz in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = AnalysisConfig {
                cpu_ghz,
                ..AnalysisConfig::default()
            };
            let err = run_analysis(&config).unwrap_err();
            assert_eq!(err.exit_code(), exit::INPUT, "cpu_ghz = {cpu_ghz}");
            assert!(err.to_string().contains("CPU frequency"));
        }
    }
}
