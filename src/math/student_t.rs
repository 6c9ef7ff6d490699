//! Student-t critical values for confidence intervals.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Two-tailed critical value `t*` such that `P(|T| <= t*) = confidence` for
/// `T ~ t(df)`.
///
/// Returns `None` for `df == 0` or a confidence level outside `(0, 1)`.
pub fn t_critical(confidence: f64, df: usize) -> Option<f64> {
    if df == 0 || !(confidence > 0.0 && confidence < 1.0) {
        return None;
    }
    let dist = StudentsT::new(0.0, 1.0, df as f64).ok()?;
    let q = dist.inverse_cdf(0.5 + confidence / 2.0);
    q.is_finite().then_some(q)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_tabulated_values() {
        // Two-tailed 95% values from standard t tables.
        let cases = [(1, 12.706), (3, 3.182), (5, 2.571), (10, 2.228), (30, 2.042)];
        for (df, expected) in cases {
            let t = t_critical(0.95, df).unwrap();
            assert!((t - expected).abs() < 2e-3, "df={df}: got {t}, expected {expected}");
        }
    }

    #[test]
    fn wider_for_higher_confidence() {
        let t90 = t_critical(0.90, 8).unwrap();
        let t99 = t_critical(0.99, 8).unwrap();
        assert!(t90 < t99);
    }

    #[test]
    fn undefined_without_degrees_of_freedom() {
        assert!(t_critical(0.95, 0).is_none());
        assert!(t_critical(1.0, 5).is_none());
        assert!(t_critical(0.0, 5).is_none());
        assert!(t_critical(f64::NAN, 5).is_none());
    }
}
