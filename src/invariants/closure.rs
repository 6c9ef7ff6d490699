//! Pipeline closure: realized work cannot exceed offered capacity.
//!
//! For each latency-bearing sample, `lhs = T · p50` is the work completed per
//! median-latency window and `rhs = C · p` is the number of requests the
//! clients can have in flight. The invariant is `lhs <= rhs` at every point.

use tracing::debug;

use crate::domain::{
    BoundCheck, Evidence, EvidenceBasis, InvariantKind, InvariantReport, Observation,
};

/// The closure comparison for one sample, or `None` without latency data.
pub fn closure_point(obs: &Observation, concurrency: u32) -> Option<BoundCheck> {
    let p50 = obs.p50_latency?;
    Some(BoundCheck {
        pipeline_depth: obs.pipeline_depth,
        lhs: obs.throughput * p50,
        rhs: concurrency as f64 * obs.pipeline_depth as f64,
    })
}

/// Check `T · p50 <= C · p` over every latency-bearing observation.
///
/// Samples without latency are skipped (and counted), never failed.
pub fn check_pipeline_closure(observations: &[Observation], concurrency: u32) -> InvariantReport {
    let mut points = Vec::new();
    let mut skipped = 0usize;
    for obs in observations {
        match closure_point(obs, concurrency) {
            Some(pt) => points.push(pt),
            None => skipped += 1,
        }
    }

    let violations: Vec<BoundCheck> = points.iter().copied().filter(|pt| !pt.holds()).collect();
    debug!(
        tested = points.len(),
        skipped,
        violations = violations.len(),
        "pipeline closure"
    );

    InvariantReport {
        kind: InvariantKind::PipelineClosure,
        passed: violations.is_empty(),
        basis: EvidenceBasis::Measured,
        violations,
        evidence: Evidence::Closure {
            concurrency,
            points,
            skipped_without_latency: skipped,
        },
    }
}
