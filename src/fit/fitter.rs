//! Fit `T(p) = p / (t0 + t1 p)` to benchmark observations.
//!
//! Given depth-ordered observations `(p_i, T_i)` we:
//! - linearize to `x_i = p_i`, `y_i = p_i / T_i` (seconds per batch)
//! - solve the closed-form OLS line `y = t0 + t1 x`
//! - compute `R²` on the linearized scale (not in throughput space)
//! - attach standard errors and Student-t intervals at `n - 2` degrees of freedom
//!
//! Everything is deterministic: the same observation sequence always yields a
//! bit-identical `FitResult`.

use tracing::{debug, warn};

use crate::domain::{
    DEFAULT_CONFIDENCE, FitResult, Interval, Observation, PointEstimate, RECOMMENDED_MIN_POINTS,
};
use crate::error::FitError;
use crate::math::{LineFit, fit_line, t_critical};
use crate::models::design_vectors;

/// Fitting is undefined with fewer distinct depths than this.
pub const MIN_DISTINCT_DEPTHS: usize = 2;

/// What to do when fewer than `min_points` observations are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinPointsPolicy {
    /// Fail with `FitError::InsufficientData`.
    Enforce,
    /// Log a warning and fit anyway (still needs two distinct depths).
    Warn,
}

/// Fitting options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Two-sided confidence level for `t0_ci` / `t1_ci`.
    pub confidence_level: f64,
    /// Recommended minimum number of observations.
    pub min_points: usize,
    pub min_points_policy: MinPointsPolicy,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            confidence_level: DEFAULT_CONFIDENCE,
            min_points: RECOMMENDED_MIN_POINTS,
            min_points_policy: MinPointsPolicy::Enforce,
        }
    }
}

/// Result of `fit_with_fallback`.
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    Full(FitResult),
    /// Intervals could not be computed; `reason` says why.
    PointOnly {
        estimate: PointEstimate,
        reason: FitError,
    },
}

impl FitOutcome {
    pub fn point(&self) -> PointEstimate {
        match self {
            FitOutcome::Full(fit) => fit.point(),
            FitOutcome::PointOnly { estimate, .. } => *estimate,
        }
    }

    pub fn full(&self) -> Option<&FitResult> {
        match self {
            FitOutcome::Full(fit) => Some(fit),
            FitOutcome::PointOnly { .. } => None,
        }
    }
}

/// Fit the model with confidence intervals.
///
/// Fails with `DegenerateFit` when the residual has zero degrees of freedom
/// (exactly two observations).
pub fn fit_model(observations: &[Observation], opts: &FitOptions) -> Result<FitResult, FitError> {
    let line = regress(observations, opts)?;

    let df = line.residual_df();
    let (Some(se_t1), Some(se_t0)) = (line.slope_std_err(), line.intercept_std_err()) else {
        return Err(FitError::DegenerateFit {
            degrees_of_freedom: df,
        });
    };
    let t_crit =
        t_critical(opts.confidence_level, df).ok_or(FitError::NonFinite("t critical value"))?;
    if !(se_t0.is_finite() && se_t1.is_finite()) {
        return Err(FitError::NonFinite("standard error"));
    }

    let fit = FitResult {
        t0: line.intercept,
        t1: line.slope,
        r_squared: line.r_squared(),
        t0_ci: Interval::around(line.intercept, t_crit * se_t0),
        t1_ci: Interval::around(line.slope, t_crit * se_t1),
        t0_std_err: se_t0,
        t1_std_err: se_t1,
        t_critical: t_crit,
        confidence_level: opts.confidence_level,
        degrees_of_freedom: df,
        sample_count: line.n,
    };
    debug!(
        t0 = fit.t0,
        t1 = fit.t1,
        r_squared = fit.r_squared,
        n = fit.sample_count,
        "fitted throughput model"
    );
    Ok(fit)
}

/// Fit `(t0, t1)` and `R²` only. Valid for exactly two observations.
pub fn fit_point_estimate(
    observations: &[Observation],
    opts: &FitOptions,
) -> Result<PointEstimate, FitError> {
    let line = regress(observations, opts)?;
    Ok(PointEstimate {
        t0: line.intercept,
        t1: line.slope,
        r_squared: line.r_squared(),
        sample_count: line.n,
    })
}

/// Fit with intervals, falling back to a point estimate when intervals are
/// undefined. Other errors are returned as-is.
pub fn fit_with_fallback(
    observations: &[Observation],
    opts: &FitOptions,
) -> Result<FitOutcome, FitError> {
    match fit_model(observations, opts) {
        Ok(fit) => Ok(FitOutcome::Full(fit)),
        Err(reason @ FitError::DegenerateFit { .. }) => {
            warn!(%reason, "reporting point estimate without confidence intervals");
            let estimate = fit_point_estimate(observations, opts)?;
            Ok(FitOutcome::PointOnly { estimate, reason })
        }
        Err(e) => Err(e),
    }
}

/// Linearized residuals `y_i - (t0 + t1 x_i)` in observation order.
pub fn linearized_residuals(observations: &[Observation], t0: f64, t1: f64) -> Vec<f64> {
    let (x, y) = design_vectors(observations);
    x.iter().zip(&y).map(|(&xi, &yi)| yi - (t0 + t1 * xi)).collect()
}

fn regress(observations: &[Observation], opts: &FitOptions) -> Result<LineFit, FitError> {
    check_sample(observations, opts)?;
    let (x, y) = design_vectors(observations);
    fit_line(&x, &y).ok_or(FitError::NonFinite("regression sums"))
}

fn check_sample(observations: &[Observation], opts: &FitOptions) -> Result<(), FitError> {
    if !(opts.confidence_level > 0.0 && opts.confidence_level < 1.0) {
        return Err(FitError::InvalidConfidence(opts.confidence_level));
    }

    let distinct = distinct_depth_count(observations);
    if distinct < MIN_DISTINCT_DEPTHS {
        return Err(FitError::InsufficientData {
            what: "distinct pipeline depths",
            found: distinct,
            required: MIN_DISTINCT_DEPTHS,
        });
    }

    let n = observations.len();
    let min_points = opts.min_points.max(MIN_DISTINCT_DEPTHS);
    if n < min_points {
        match opts.min_points_policy {
            MinPointsPolicy::Enforce => {
                return Err(FitError::InsufficientData {
                    what: "observations",
                    found: n,
                    required: min_points,
                });
            }
            MinPointsPolicy::Warn => {
                warn!(n, min_points, "fitting on fewer observations than recommended");
            }
        }
    }

    Ok(())
}

fn distinct_depth_count(observations: &[Observation]) -> usize {
    let mut depths: Vec<u32> = observations.iter().map(|o| o.pipeline_depth).collect();
    depths.sort_unstable();
    depths.dedup();
    depths.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::derive_metrics;
    use crate::models::predict_throughput;

    const T0: f64 = 12.5e-6;
    const T1: f64 = 69.6e-9;

    fn exact(t0: f64, t1: f64, depths: &[u32]) -> Vec<Observation> {
        depths
            .iter()
            .map(|&p| Observation::new(p, predict_throughput(p as f64, t0, t1)))
            .collect()
    }

    fn relaxed() -> FitOptions {
        FitOptions {
            min_points_policy: MinPointsPolicy::Warn,
            ..FitOptions::default()
        }
    }

    #[test]
    fn recovers_parameters_from_exact_data() {
        let obs = exact(T0, T1, &[1, 2, 4, 8, 16, 32, 64, 128]);
        let fit = fit_model(&obs, &FitOptions::default()).unwrap();

        assert!((fit.t0 - T0).abs() / T0 < 1e-9, "t0={}", fit.t0);
        assert!((fit.t1 - T1).abs() / T1 < 1e-9, "t1={}", fit.t1);
        assert!(fit.r_squared >= 0.999_999);
        assert!(fit.r_squared <= 1.0);
        assert_eq!(fit.sample_count, 8);
        assert_eq!(fit.degrees_of_freedom, 6);
        assert!(fit.t0_ci.contains(fit.t0));
        assert!(fit.t1_ci.contains(fit.t1));
    }

    #[test]
    fn noisy_fit_has_intervals_around_estimates() {
        let mut obs = exact(T0, T1, &[1, 2, 4, 8, 16, 32, 64]);
        let wiggle = [1.02, 0.97, 1.01, 0.99, 1.03, 0.98, 1.0];
        for (o, w) in obs.iter_mut().zip(wiggle) {
            o.throughput *= w;
        }

        let fit = fit_model(&obs, &FitOptions::default()).unwrap();
        assert!(fit.r_squared < 1.0);
        assert!(fit.t0_std_err > 0.0 && fit.t1_std_err > 0.0);
        assert!(fit.t0_ci.lower < fit.t0 && fit.t0 < fit.t0_ci.upper);
        assert!(fit.t1_ci.lower < fit.t1 && fit.t1 < fit.t1_ci.upper);
        assert!((fit.t_critical - 2.571).abs() < 2e-3);
    }

    #[test]
    fn refitting_is_bit_identical() {
        let mut obs = exact(T0, T1, &[1, 4, 4, 16, 64, 256]);
        obs[2].throughput *= 1.05;
        let a = fit_model(&obs, &FitOptions::default()).unwrap();
        let b = fit_model(&obs, &FitOptions::default()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.t0.to_bits(), b.t0.to_bits());
        assert_eq!(a.t1.to_bits(), b.t1.to_bits());
    }

    #[test]
    fn single_depth_is_insufficient() {
        let obs = exact(T0, T1, &[8, 8, 8, 8, 8, 8]);
        let err = fit_model(&obs, &relaxed()).unwrap_err();
        assert_eq!(
            err,
            FitError::InsufficientData {
                what: "distinct pipeline depths",
                found: 1,
                required: 2,
            }
        );
        assert!(matches!(
            fit_point_estimate(&[], &relaxed()),
            Err(FitError::InsufficientData { found: 0, .. })
        ));
    }

    #[test]
    fn enforced_minimum_rejects_sparse_sets() {
        let obs = exact(T0, T1, &[1, 2, 4, 8]);
        let err = fit_model(&obs, &FitOptions::default()).unwrap_err();
        assert_eq!(
            err,
            FitError::InsufficientData {
                what: "observations",
                found: 4,
                required: 5,
            }
        );
        assert!(fit_model(&obs, &relaxed()).is_ok());
    }

    #[test]
    fn two_points_are_degenerate_for_intervals() {
        let obs = exact(T0, T1, &[1, 64]);
        let err = fit_model(&obs, &relaxed()).unwrap_err();
        assert_eq!(err, FitError::DegenerateFit { degrees_of_freedom: 0 });

        let est = fit_point_estimate(&obs, &relaxed()).unwrap();
        assert!((est.t1 - T1).abs() / T1 < 1e-9);

        match fit_with_fallback(&obs, &relaxed()).unwrap() {
            FitOutcome::PointOnly { estimate, reason } => {
                assert_eq!(estimate, est);
                assert_eq!(reason, FitError::DegenerateFit { degrees_of_freedom: 0 });
            }
            other => panic!("expected point-only outcome, got {other:?}"),
        }
    }

    #[test]
    fn invalid_confidence_is_rejected() {
        let obs = exact(T0, T1, &[1, 2, 4, 8, 16]);
        let opts = FitOptions {
            confidence_level: 1.5,
            ..FitOptions::default()
        };
        assert_eq!(
            fit_model(&obs, &opts).unwrap_err(),
            FitError::InvalidConfidence(1.5)
        );
    }

    #[test]
    fn doubling_throughput_doubles_saturation() {
        let depths = [1, 2, 4, 8, 16, 32];
        let base = fit_model(&exact(T0, T1, &depths), &FitOptions::default()).unwrap();
        let doubled: Vec<Observation> = exact(T0, T1, &depths)
            .into_iter()
            .map(|mut o| {
                o.throughput *= 2.0;
                o
            })
            .collect();
        let fast = fit_model(&doubled, &FitOptions::default()).unwrap();

        let a = derive_metrics(base.t0, base.t1).t_max.value().unwrap();
        let b = derive_metrics(fast.t0, fast.t1).t_max.value().unwrap();
        assert!((b / a - 2.0).abs() < 1e-9);
    }

    #[test]
    fn residuals_vanish_on_exact_data() {
        let obs = exact(T0, T1, &[1, 3, 9, 27]);
        let r = linearized_residuals(&obs, T0, T1);
        assert_eq!(r.len(), 4);
        assert!(r.iter().all(|v| v.abs() < 1e-18));
    }
}
