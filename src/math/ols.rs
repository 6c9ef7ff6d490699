//! Closed-form simple linear regression.
//!
//! We only ever regress one variable on one regressor with an intercept:
//!
//! ```text
//! y_i = a + b x_i + e_i
//! ```
//!
//! so the normal equations have the textbook solution
//!
//! ```text
//! b = Σ(x - x̄)(y - ȳ) / Σ(x - x̄)²      a = ȳ - b x̄
//! ```
//!
//! Implementation choices:
//! - Two passes (means first, then centered sums) for accuracy.
//! - Sums run in input order with no parallelism, so identical inputs give
//!   bit-identical outputs.
//! - `SS_res` is accumulated from the explicit residuals rather than derived
//!   algebraically from `Sxy²/Sxx`.

/// A fitted line plus the sums needed for inference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub n: usize,
    pub intercept: f64,
    pub slope: f64,
    pub x_mean: f64,
    pub y_mean: f64,
    /// `Σ(x - x̄)²`
    pub sxx: f64,
    /// `Σ(y - ŷ)²`
    pub ss_res: f64,
    /// `Σ(y - ȳ)²`
    pub ss_tot: f64,
}

impl LineFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// `1 - SS_res/SS_tot`, unclamped.
    ///
    /// When every `y` is identical the line reproduces them exactly and we
    /// report `1.0`.
    pub fn r_squared(&self) -> f64 {
        if self.ss_tot > 0.0 {
            1.0 - self.ss_res / self.ss_tot
        } else {
            1.0
        }
    }

    /// Residual degrees of freedom, `n - 2`.
    pub fn residual_df(&self) -> usize {
        self.n.saturating_sub(2)
    }

    /// `SS_res / (n - 2)`; `None` with zero degrees of freedom.
    pub fn mse(&self) -> Option<f64> {
        let df = self.residual_df();
        if df == 0 {
            return None;
        }
        Some(self.ss_res / df as f64)
    }

    /// `sqrt(MSE / Sxx)`
    pub fn slope_std_err(&self) -> Option<f64> {
        self.mse().map(|mse| (mse / self.sxx).sqrt())
    }

    /// `sqrt(MSE (1/n + x̄²/Sxx))`
    pub fn intercept_std_err(&self) -> Option<f64> {
        let n = self.n as f64;
        self.mse()
            .map(|mse| (mse * (1.0 / n + self.x_mean * self.x_mean / self.sxx)).sqrt())
    }
}

/// Fit `y = a + b x` by ordinary least squares.
///
/// Returns `None` if the slices differ in length, hold fewer than two points,
/// have no spread in `x`, or produce non-finite sums.
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<LineFit> {
    let n = x.len();
    if n < 2 || y.len() != n {
        return None;
    }

    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut ss_tot = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxx += dx * dx;
        sxy += dx * dy;
        ss_tot += dy * dy;
    }

    if !(sxx.is_finite() && sxx > 0.0) || !sxy.is_finite() || !ss_tot.is_finite() {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let ss_res: f64 = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            let r = yi - (intercept + slope * xi);
            r * r
        })
        .sum();

    if !(slope.is_finite() && intercept.is_finite() && ss_res.is_finite()) {
        return None;
    }

    Some(LineFit {
        n,
        intercept,
        slope,
        x_mean,
        y_mean,
        sxx,
        ss_res,
        ss_tot,
    })
}
