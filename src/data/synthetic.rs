//! Synthetic benchmark observations drawn from the throughput model.
//!
//! Throughput is the model value `p / (t0 + t1 p)` times log-normal noise.
//! Latency is then set so that `T · p50 = utilization · C · p`, which keeps
//! pipeline closure satisfied for any `utilization <= 1`.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::debug;

use crate::domain::{DEFAULT_CONCURRENCY, Observation};
use crate::error::AppError;
use crate::models::predict_throughput;

/// Powers of two from 1 to 256.
pub const DEFAULT_DEPTHS: [u32; 9] = [1, 2, 4, 8, 16, 32, 64, 128, 256];

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSpec {
    /// Fixed cost per batch (seconds).
    pub t0: f64,
    /// Marginal cost per operation (seconds).
    pub t1: f64,
    pub depths: Vec<u32>,
    pub concurrency: u32,
    /// Standard deviation of the log-throughput noise (0 = exact model values).
    pub noise_rel: f64,
    /// Fraction of the closure bound used by the generated latency.
    pub utilization: f64,
    pub seed: u64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            t0: 12e-6,
            t1: 70e-9,
            depths: DEFAULT_DEPTHS.to_vec(),
            concurrency: DEFAULT_CONCURRENCY,
            noise_rel: 0.02,
            utilization: 0.9,
            seed: 42,
        }
    }
}

/// Draw one observation per depth. Deterministic for a fixed `spec`.
pub fn generate_observations(spec: &SyntheticSpec) -> Result<Vec<Observation>, AppError> {
    validate(spec)?;

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::input(format!("Noise distribution error: {e}")))?;

    let c = spec.concurrency as f64;
    let mut out = Vec::with_capacity(spec.depths.len());
    for &depth in &spec.depths {
        let p = depth as f64;
        let z: f64 = normal.sample(&mut rng);
        let throughput = predict_throughput(p, spec.t0, spec.t1) * (spec.noise_rel * z).exp();
        let p50 = spec.utilization * c * p / throughput;
        out.push(Observation::new(depth, throughput).with_latency(p50));
    }

    debug!(
        seed = spec.seed,
        n = out.len(),
        noise = spec.noise_rel,
        "generated synthetic observations"
    );
    Ok(out)
}

fn validate(spec: &SyntheticSpec) -> Result<(), AppError> {
    if !(spec.t0.is_finite() && spec.t0 >= 0.0) {
        return Err(AppError::input("t0 must be finite and >= 0."));
    }
    if !(spec.t1.is_finite() && spec.t1 > 0.0) {
        return Err(AppError::input("t1 must be finite and > 0."));
    }
    if spec.depths.is_empty() {
        return Err(AppError::input("At least one pipeline depth is required."));
    }
    if spec.depths.contains(&0) {
        return Err(AppError::input("Pipeline depths must be >= 1."));
    }
    if spec.concurrency == 0 {
        return Err(AppError::input("Concurrency must be >= 1."));
    }
    if !(spec.noise_rel.is_finite() && spec.noise_rel >= 0.0) {
        return Err(AppError::input("Noise must be finite and >= 0."));
    }
    if !(spec.utilization.is_finite() && spec.utilization > 0.0) {
        return Err(AppError::input("Utilization must be finite and > 0."));
    }
    Ok(())
}
