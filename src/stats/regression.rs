use serde::Serialize;

use super::{dist, finite_pairs, mean, negligible, StatsError};

/// Simple linear regression `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Two-sided p-value of the slope; absent when there are no residual degrees of freedom
    /// or y is constant.
    pub p_value: Option<f64>,
    pub std_err: Option<f64>,
    /// Pearson r; absent when y is constant.
    pub correlation: Option<f64>,
    pub n: usize,
}

impl Regression {
    pub fn predict(&self, x: f64) -> f64 { self.intercept + self.slope * x }
}

/// Ordinary least squares with an intercept term, closed form.
pub fn ols(xs: &[f64], ys: &[f64]) -> Result<Regression, StatsError> {
    let (xs, ys) = finite_pairs(xs, ys)?;
    let n = xs.len();
    if n < 2 {
        return Err(StatsError::InsufficientData { needed: 2, found: n });
    }
    let (mx, my) = (mean(&xs), mean(&ys));
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(&ys) {
        let (dx, dy) = (x - mx, y - my);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if negligible(sxx, &xs) {
        return Err(StatsError::degenerate("zero variance in the independent variable"));
    }
    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    let sse: f64 = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| {
            let e = y - (intercept + slope * x);
            e * e
        })
        .sum();

    let flat_y = negligible(syy, &ys);
    let r_squared = if flat_y { 0.0 } else { (1.0 - sse / syy).clamp(0.0, 1.0) };
    let correlation = if flat_y { None } else { Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)) };

    let df = n - 2;
    let (std_err, p_value) = if df == 0 {
        (None, None)
    } else {
        let se = (sse / df as f64 / sxx).sqrt();
        let p = if flat_y {
            None
        } else if se == 0.0 {
            Some(0.0)
        } else {
            Some(dist::student_t_two_sided(slope / se, df as f64))
        };
        (Some(se), p)
    };
    Ok(Regression { slope, intercept, r_squared, p_value, std_err, correlation, n })
}
