//! Reporting: per-observation residuals, the serializable analysis report, and
//! formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting/invariant code stays clean and testable
//! - output changes are localized

pub mod format;

pub use format::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::pipeline::GroupAnalysis;
use crate::domain::{
    BoundCheck, DerivedMetrics, Evidence, FitResult, InvariantReport, Observation, PaperUnits,
    PointEstimate, SyscallPoint,
};
use crate::fit::FitOutcome;
use crate::io::RowError;
use crate::models::{batch_time, linearize, paper_units, paper_units_point, predict_throughput};

pub const TOOL_NAME: &str = "tput";

/// Fitted values for one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationResidual {
    pub observation: Observation,
    /// `p / T` (seconds per batch).
    pub y_obs: f64,
    /// `t0 + t1 p`
    pub y_fit: f64,
    /// Model throughput (ops/second); `NaN` where the fit is unphysical.
    pub throughput_fit: f64,
    /// Measured minus model throughput.
    pub residual: f64,
}

/// Compute fitted values and residuals for each observation.
pub fn compute_residuals(
    observations: &[Observation],
    est: &PointEstimate,
) -> Vec<ObservationResidual> {
    observations
        .iter()
        .map(|obs| {
            let (x, y_obs) = linearize(obs);
            let throughput_fit = predict_throughput(x, est.t0, est.t1);
            ObservationResidual {
                observation: *obs,
                y_obs,
                y_fit: batch_time(x, est.t0, est.t1),
                throughput_fit,
                residual: obs.throughput - throughput_fit,
            }
        })
        .collect()
}

/// Fit status of one concurrency group, as written to JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FitSection {
    Fitted {
        raw: FitResult,
        paper: PaperUnits,
    },
    PointOnly {
        raw: PointEstimate,
        paper: PaperUnits,
        reason: String,
    },
    Failed {
        reason: String,
    },
}

impl FitSection {
    pub fn point(&self) -> Option<PointEstimate> {
        match self {
            FitSection::Fitted { raw, .. } => Some(raw.point()),
            FitSection::PointOnly { raw, .. } => Some(*raw),
            FitSection::Failed { .. } => None,
        }
    }
}

/// Report for one concurrency group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupReport {
    pub concurrency: u32,
    pub observations_used: usize,
    pub records_skipped: usize,
    pub fit: FitSection,
    pub derived: Option<DerivedMetrics>,
    pub invariants: Vec<InvariantReport>,
    pub observations: Vec<Observation>,
}

impl GroupReport {
    /// Closure comparisons recorded by the pipeline-closure check.
    pub fn closure_points(&self) -> &[BoundCheck] {
        self.invariants
            .iter()
            .find_map(|r| match &r.evidence {
                Evidence::Closure { points, .. } => Some(points.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Concurrency and expected curve recorded by the syscall-budget check.
    pub fn syscall_curve(&self) -> Option<(u32, &[SyscallPoint])> {
        self.invariants.iter().find_map(|r| match &r.evidence {
            Evidence::SyscallCurve {
                concurrency,
                points,
            } => Some((*concurrency, points.as_slice())),
            _ => None,
        })
    }
}

/// The full, serializable result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub source: String,
    /// Files and rows the loader could not read, before any grouping.
    #[serde(default)]
    pub input_errors: Vec<RowError>,
    pub groups: Vec<GroupReport>,
}

impl AnalysisReport {
    pub fn all_passed(&self) -> bool {
        self.groups
            .iter()
            .flat_map(|g| &g.invariants)
            .all(|r| r.passed)
    }

    /// Unreadable inputs plus records rejected inside every group.
    pub fn records_skipped_total(&self) -> usize {
        self.input_errors.len() + self.groups.iter().map(|g| g.records_skipped).sum::<usize>()
    }
}

/// Package pipeline output into the serializable report.
pub fn assemble_report(
    source: &str,
    input_errors: &[RowError],
    groups: &[GroupAnalysis],
    generated_at: DateTime<Utc>,
) -> AnalysisReport {
    AnalysisReport {
        tool: TOOL_NAME.to_string(),
        generated_at,
        source: source.to_string(),
        input_errors: input_errors.to_vec(),
        groups: groups.iter().map(group_report).collect(),
    }
}

fn group_report(g: &GroupAnalysis) -> GroupReport {
    let fit = match &g.outcome {
        Ok(FitOutcome::Full(fit)) => FitSection::Fitted {
            raw: *fit,
            paper: paper_units(fit),
        },
        Ok(FitOutcome::PointOnly { estimate, reason }) => FitSection::PointOnly {
            raw: *estimate,
            paper: paper_units_point(estimate),
            reason: reason.to_string(),
        },
        Err(e) => FitSection::Failed {
            reason: e.to_string(),
        },
    };

    GroupReport {
        concurrency: g.concurrency,
        observations_used: g.observations.len(),
        records_skipped: g.observations.skipped().len(),
        fit,
        derived: g.derived,
        invariants: g.invariants.clone(),
        observations: g.observations.observations().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ObservationSet;
    use crate::error::FitError;

    #[test]
    fn residuals_are_zero_on_the_model() {
        let est = PointEstimate {
            t0: 10e-6,
            t1: 100e-9,
            r_squared: 1.0,
            sample_count: 2,
        };
        let obs = [
            Observation::new(1, predict_throughput(1.0, est.t0, est.t1)),
            Observation::new(100, 40_000.0),
        ];
        let r = compute_residuals(&obs, &est);
        assert!(r[0].residual.abs() < 1e-6);
        assert!((r[0].y_obs - r[0].y_fit).abs() < 1e-18);
        // T(100) = 100 / 20us = 5 Mops/s
        assert!((r[1].throughput_fit - 5e6).abs() < 1e-3);
        assert!((r[1].residual - (40_000.0 - 5e6)).abs() < 1e-3);
    }

    #[test]
    fn failed_group_is_reported_with_reason() {
        let g = GroupAnalysis {
            concurrency: 50,
            observations: ObservationSet::from_observations(vec![Observation::new(1, 10.0)]),
            outcome: Err(FitError::InsufficientData {
                what: "distinct pipeline depths",
                found: 1,
                required: 2,
            }),
            derived: None,
            invariants: vec![],
        };
        let unreadable = RowError {
            source: "bench_P8.csv".to_string(),
            message: "missing `rps` column".to_string(),
        };
        let report = assemble_report("x", &[unreadable], &[g], Utc::now());
        assert!(report.all_passed());
        assert_eq!(report.records_skipped_total(), 1);
        match &report.groups[0].fit {
            FitSection::Failed { reason } => assert!(reason.contains("distinct pipeline depths")),
            other => panic!("unexpected {other:?}"),
        }
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["groups"][0]["fit"]["status"], "failed");
        assert!(json["groups"][0]["derived"].is_null());
        assert_eq!(json["input_errors"][0]["source"], "bench_P8.csv");
    }
}
