//! Model evaluation for `T(p) = p / (t0 + t1 p)`.
//!
//! The fitter relies on two primitive operations:
//! - linearize an observation into `(x, y) = (p, p/T)`, where `y = t0 + t1 x`
//! - predict `T(p)` given `(t0, t1)` (for residuals/plots)
//!
//! Unit conversions for the microsecond/nanosecond presentation also live here
//! so the fitting arithmetic stays in base units.

use crate::domain::{FitResult, Observation, PaperUnits, PointEstimate};
use crate::fit::derived::saturation_throughput;

pub const US_PER_S: f64 = 1e6;
pub const NS_PER_S: f64 = 1e9;
pub const OPS_PER_MOPS: f64 = 1e6;

/// Linearized design point `(p, p/T)`.
pub fn linearize(obs: &Observation) -> (f64, f64) {
    (obs.pipeline_depth as f64, obs.seconds_per_batch())
}

/// Split a depth-ordered observation slice into regression vectors.
pub fn design_vectors(observations: &[Observation]) -> (Vec<f64>, Vec<f64>) {
    observations.iter().map(linearize).unzip()
}

/// Seconds per batch-worth of work at depth `p`: `t0 + t1 p`.
pub fn batch_time(p: f64, t0: f64, t1: f64) -> f64 {
    t0 + t1 * p
}

/// Predicted throughput (ops/second) at depth `p`.
///
/// Returns `NaN` where the model is not physical (`t0 + t1 p <= 0`).
pub fn predict_throughput(p: f64, t0: f64, t1: f64) -> f64 {
    let denom = batch_time(p, t0, t1);
    if denom > 0.0 { p / denom } else { f64::NAN }
}

/// Presentation view of a full fit.
pub fn paper_units(fit: &FitResult) -> PaperUnits {
    PaperUnits {
        t0_ci_us: Some(fit.t0_ci.scaled(US_PER_S)),
        t1_ci_ns: Some(fit.t1_ci.scaled(NS_PER_S)),
        ..paper_units_point(&fit.point())
    }
}

/// Presentation view of a point estimate (no intervals).
pub fn paper_units_point(est: &PointEstimate) -> PaperUnits {
    PaperUnits {
        t0_us_per_batch: est.t0 * US_PER_S,
        t1_ns_per_op: est.t1 * NS_PER_S,
        t0_ci_us: None,
        t1_ci_ns: None,
        t_max_mops: saturation_throughput(est.t1).map(|t| t / OPS_PER_MOPS),
    }
}
