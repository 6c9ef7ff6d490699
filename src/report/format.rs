//! Terminal formatting for analysis reports.

use crate::domain::{Evidence, EvidenceBasis, InvariantReport};
use crate::models::{NS_PER_S, US_PER_S};
use crate::report::{AnalysisReport, FitSection, GroupReport, ObservationResidual};

/// Format the full run summary (one block per concurrency group).
pub fn format_run_summary(report: &AnalysisReport) -> String {
    let mut out = format_run_header(report);

    for group in &report.groups {
        out.push('\n');
        out.push_str(&format_group_fit(group));
    }

    out
}

/// Title, source, timestamp and the inputs the loader had to skip.
pub fn format_run_header(report: &AnalysisReport) -> String {
    let mut out = String::new();

    out.push_str("=== tput - Batched-Service Throughput Model ===\n");
    out.push_str(&format!("Source: {}\n", report.source));
    out.push_str(&format!("Generated: {}\n", report.generated_at.to_rfc3339()));
    out.push_str(&format!(
        "Skipped records: {} ({} unreadable input(s))\n",
        report.records_skipped_total(),
        report.input_errors.len()
    ));
    for e in &report.input_errors {
        out.push_str(&format!("   {}: {}\n", e.source, e.message));
    }

    out
}

/// Format the fit section for one group.
pub fn format_group_fit(group: &GroupReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "--- C={} | n={} | skipped={} ---\n",
        group.concurrency, group.observations_used, group.records_skipped
    ));

    match &group.fit {
        FitSection::Fitted { raw, paper } => {
            out.push_str("Model: T(p) = p / (t0 + t1 p)\n");
            let ci0 = raw.t0_ci.scaled(US_PER_S);
            let ci1 = raw.t1_ci.scaled(NS_PER_S);
            out.push_str(&format!(
                "t0 = {:.2} us/batch [{:.2}, {:.2}]\n",
                paper.t0_us_per_batch, ci0.lower, ci0.upper
            ));
            out.push_str(&format!(
                "t1 = {:.1} ns/op [{:.1}, {:.1}]\n",
                paper.t1_ns_per_op, ci1.lower, ci1.upper
            ));
            out.push_str(&format!(
                "R² = {:.6} (linearized p/T) | {:.0}% CI, df={}\n",
                raw.r_squared,
                raw.confidence_level * 100.0,
                raw.degrees_of_freedom
            ));
        }
        FitSection::PointOnly { raw, paper, reason } => {
            out.push_str("Model: T(p) = p / (t0 + t1 p)  (point estimate)\n");
            out.push_str(&format!("t0 = {:.2} us/batch\n", paper.t0_us_per_batch));
            out.push_str(&format!("t1 = {:.1} ns/op\n", paper.t1_ns_per_op));
            out.push_str(&format!("R² = {:.6} (linearized p/T)\n", raw.r_squared));
            out.push_str(&format!("No confidence intervals: {reason}\n"));
        }
        FitSection::Failed { reason } => {
            out.push_str(&format!("Model fitting failed: {reason}\n"));
        }
    }

    if let Some(d) = &group.derived {
        out.push_str(&format!(
            "Tmax = {} Mops/s | knee p ≈ {:.1} (T = {} Mops/s)\n",
            fmt_mops(d.t_max.value()),
            d.knee_depth,
            fmt_mops(d.knee_throughput.value()),
        ));
    }

    out
}

/// Format invariant PASS/FAIL lines plus supporting evidence.
pub fn format_invariants(reports: &[InvariantReport]) -> String {
    let mut out = String::new();
    out.push_str("Invariants:\n");

    for (i, r) in reports.iter().enumerate() {
        let verdict = if r.passed { "PASS" } else { "FAIL" };
        let basis = match r.basis {
            EvidenceBasis::Measured => "",
            EvidenceBasis::Theoretical => " (theoretical)",
        };
        out.push_str(&format!(
            "{}. {}: {verdict}{basis}\n",
            i + 1,
            r.kind.display_name()
        ));

        match &r.evidence {
            Evidence::Closure {
                concurrency,
                points,
                skipped_without_latency,
            } => {
                out.push_str(&format!(
                    "   T · p50 <= {concurrency} · p | tested={} violations={} no-latency={}\n",
                    points.len(),
                    r.violations.len(),
                    skipped_without_latency
                ));
                for v in &r.violations {
                    out.push_str(&format!(
                        "   p={}: {:.1} > {:.1}\n",
                        v.pipeline_depth, v.lhs, v.rhs
                    ));
                }
            }
            Evidence::SyscallCurve { concurrency, points } => {
                let parts: Vec<String> = points
                    .iter()
                    .map(|p| format!("p={}:{:.6}", p.pipeline_depth, p.syscalls_per_op))
                    .collect();
                out.push_str(&format!(
                    "   syscalls/op = 2/({concurrency}·p): {}\n",
                    parts.join(" ")
                ));
            }
            Evidence::CyclesEstimate {
                frequency_ghz,
                t1_ns_per_op,
                cycles_per_op,
            } => match (t1_ns_per_op, cycles_per_op) {
                (Some(t1), Some(c)) => out.push_str(&format!(
                    "   ~{c:.0} cycles/op (t1 = {t1:.1} ns/op at {frequency_ghz:.2} GHz)\n"
                )),
                _ => out.push_str("   no fitted t1 available\n"),
            },
        }
    }

    out
}

/// Format the per-observation residual table.
pub fn format_residuals(rows: &[ObservationResidual]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>6} {:>14} {:>14} {:>12} {:>12}\n",
            "p", "T_obs (ops/s)", "T_fit (ops/s)", "resid %", "p50 (ms)"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!("{:->6} {:->14} {:->14} {:->12} {:->12}\n", "", "", "", "", "").trim_end(),
    );
    out.push('\n');

    for r in rows {
        let o = &r.observation;
        let pct = if r.throughput_fit.is_finite() {
            format!("{:.2}", 100.0 * r.residual / r.throughput_fit)
        } else {
            "n/a".to_string()
        };
        out.push_str(
            format!(
                "{:>6} {:>14.0} {:>14} {:>12} {:>12}\n",
                o.pipeline_depth,
                o.throughput,
                fmt_opt(r.throughput_fit, 0),
                pct,
                o.p50_latency
                    .map(|l| format!("{:.3}", l * 1e3))
                    .unwrap_or_default(),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn fmt_mops(ops: Option<f64>) -> String {
    match ops {
        Some(v) => format!("{:.2}", v / 1e6),
        None => "undefined".to_string(),
    }
}

fn fmt_opt(v: f64, prec: usize) -> String {
    if v.is_finite() {
        format!("{v:.prec$}")
    } else {
        "n/a".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoundCheck, InvariantKind, Observation};
    use crate::invariants::{check_cycles_per_op, check_pipeline_closure};
    use crate::io::RowError;

    #[test]
    fn invariants_show_violations_and_theoretical_basis() {
        let obs = [Observation::new(10, 100_000.0).with_latency(0.02)];
        let reports = vec![
            check_pipeline_closure(&obs, 50),
            check_cycles_per_op(Some(69.6e-9), 3.5),
        ];
        let txt = format_invariants(&reports);
        assert!(txt.contains("1. Pipeline Closure: FAIL\n"));
        assert!(txt.contains("   p=10: 2000.0 > 500.0\n"));
        assert!(txt.contains("2. Cycles/op Band: PASS (theoretical)\n"));
        assert!(txt.contains("~244 cycles/op"));
        assert_eq!(reports[0].kind, InvariantKind::PipelineClosure);
        assert_eq!(
            reports[0].violations,
            vec![BoundCheck {
                pipeline_depth: 10,
                lhs: 100_000.0 * 0.02,
                rhs: 500.0
            }]
        );
    }

    #[test]
    fn run_header_lists_unreadable_inputs() {
        let report = AnalysisReport {
            tool: "tput".to_string(),
            generated_at: chrono::Utc::now(),
            source: "runs/".to_string(),
            input_errors: vec![RowError {
                source: "bench_C0_P4.csv".to_string(),
                message: "client count `C0` must be positive".to_string(),
            }],
            groups: vec![],
        };
        let txt = format_run_summary(&report);
        assert!(txt.contains("Skipped records: 1 (1 unreadable input(s))\n"));
        assert!(txt.contains("   bench_C0_P4.csv: client count `C0` must be positive\n"));
    }

    #[test]
    fn residual_table_marks_unphysical_fits() {
        let rows = vec![ObservationResidual {
            observation: Observation::new(4, 1000.0),
            y_obs: 0.004,
            y_fit: -1.0,
            throughput_fit: f64::NAN,
            residual: f64::NAN,
        }];
        let txt = format_residuals(&rows);
        let last = txt.lines().last().unwrap();
        assert!(last.contains("n/a"));
        assert!(last.trim_start().starts_with('4'));
    }
}
