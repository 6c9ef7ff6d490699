//! Secondary quantities derived from a fitted `(t0, t1)`.
//!
//! `t1 <= 0` is a legitimate (if unphysical) fit outcome, so these functions
//! never fail: they return `DerivedValue::Undefined` instead.

use crate::domain::{DerivedMetrics, DerivedValue, PointEstimate};
use crate::models::predict_throughput;

/// Saturation throughput `T_max = 1/t1` (ops/second).
pub fn saturation_throughput(t1: f64) -> DerivedValue {
    if t1 > 0.0 {
        DerivedValue::from(Some(1.0 / t1))
    } else {
        DerivedValue::Undefined
    }
}

/// Knee depth `t0/t1`, where `T(p) = T_max / 2`.
pub fn knee_depth(t0: f64, t1: f64) -> DerivedValue {
    if t1 > 0.0 {
        DerivedValue::from(Some(t0 / t1))
    } else {
        DerivedValue::Undefined
    }
}

pub fn derive_metrics(t0: f64, t1: f64) -> DerivedMetrics {
    let t_max = saturation_throughput(t1);
    DerivedMetrics {
        t_max,
        knee_depth: knee_depth(t0, t1),
        knee_throughput: t_max.map(|t| t / 2.0),
    }
}

/// Model throughput at depth `p`; undefined where `t0 + t1 p <= 0`.
pub fn throughput_at(est: &PointEstimate, p: f64) -> DerivedValue {
    DerivedValue::from(Some(predict_throughput(p, est.t0, est.t1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knee_is_half_of_saturation() {
        let (t0, t1) = (12e-6, 70e-9);
        let m = derive_metrics(t0, t1);
        let knee = m.knee_depth.value().unwrap();
        let t_max = m.t_max.value().unwrap();

        assert!((knee * t1 - t0).abs() < 1e-18);
        let at_knee = predict_throughput(knee, t0, t1);
        assert!((at_knee - t_max / 2.0).abs() / t_max < 1e-12);
        assert_eq!(m.knee_throughput.value().unwrap(), t_max / 2.0);
    }

    #[test]
    fn non_positive_t1_is_undefined() {
        for t1 in [0.0, -1e-9] {
            let m = derive_metrics(1e-5, t1);
            assert_eq!(m.t_max, DerivedValue::Undefined);
            assert_eq!(m.knee_depth, DerivedValue::Undefined);
            assert_eq!(m.knee_throughput, DerivedValue::Undefined);
        }
    }

    #[test]
    fn throughput_at_follows_the_model() {
        let est = PointEstimate {
            t0: 10e-6,
            t1: 100e-9,
            r_squared: 1.0,
            sample_count: 5,
        };
        // 100 / (10us + 10us) = 5 Mops/s
        let t = throughput_at(&est, 100.0).value().unwrap();
        assert!((t - 5e6).abs() < 1e-3);

        let unphysical = PointEstimate { t0: -1e-3, ..est };
        assert_eq!(throughput_at(&unphysical, 1.0), DerivedValue::Undefined);
    }

    #[test]
    fn subnormal_t1_overflowing_to_infinity_is_undefined() {
        assert_eq!(saturation_throughput(1e-320), DerivedValue::Undefined);
    }
}
