//! Cycles-per-op: the fitted marginal cost expressed in CPU cycles.
//!
//! `cycles/op ≈ t1[ns] · f[GHz]`. Without performance-counter samples this is a
//! point estimate, so the report always passes with a `Theoretical` basis.

use crate::domain::{Evidence, EvidenceBasis, InvariantKind, InvariantReport};
use crate::models::NS_PER_S;

/// Cycles per operation for a marginal cost `t1` (seconds/op).
pub fn estimate_cycles_per_op(t1: f64, cpu_ghz: f64) -> f64 {
    t1 * NS_PER_S * cpu_ghz
}

pub fn check_cycles_per_op(t1: Option<f64>, cpu_ghz: f64) -> InvariantReport {
    InvariantReport {
        kind: InvariantKind::CyclesPerOpBand,
        passed: true,
        basis: EvidenceBasis::Theoretical,
        violations: Vec::new(),
        evidence: Evidence::CyclesEstimate {
            frequency_ghz: cpu_ghz,
            t1_ns_per_op: t1.map(|t| t * NS_PER_S),
            cycles_per_op: t1.map(|t| estimate_cycles_per_op(t, cpu_ghz)),
        },
    }
}
