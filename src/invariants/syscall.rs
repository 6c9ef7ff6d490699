//! Syscall budget: one read and one write per batch across `C` connections
//! gives `syscalls/op = 2 / (C · p)`.
//!
//! No syscall traces are modelled, so the report only carries the expected
//! curve and always passes. Its basis is `Theoretical`.
// TODO: compare against strace/dtruss counts once trace ingest exists.

use crate::domain::{Evidence, EvidenceBasis, InvariantKind, InvariantReport, SyscallPoint};

pub fn expected_syscalls_per_op(concurrency: u32, pipeline_depth: u32) -> f64 {
    2.0 / (concurrency as f64 * pipeline_depth as f64)
}

pub fn check_syscall_budget(depths: &[u32], concurrency: u32) -> InvariantReport {
    let points = depths
        .iter()
        .map(|&p| SyscallPoint {
            pipeline_depth: p,
            syscalls_per_op: expected_syscalls_per_op(concurrency, p),
        })
        .collect();

    InvariantReport {
        kind: InvariantKind::SyscallBudget,
        passed: true,
        basis: EvidenceBasis::Theoretical,
        violations: Vec::new(),
        evidence: Evidence::SyscallCurve { concurrency, points },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_follows_inverse_depth() {
        let report = check_syscall_budget(&[1, 2, 10], 50);
        assert!(report.passed);
        let Evidence::SyscallCurve { points, concurrency } = report.evidence else {
            panic!("unexpected evidence");
        };
        assert_eq!(concurrency, 50);
        let values: Vec<f64> = points.iter().map(|p| p.syscalls_per_op).collect();
        assert!((values[0] - 0.04).abs() < 1e-15);
        assert!((values[1] - 0.02).abs() < 1e-15);
        assert!((values[2] - 0.004).abs() < 1e-15);
    }
}
