use serde::Serialize;

use super::{dist, finite_pairs, mean, negligible, StatsError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Correlation {
    pub r: f64,
    /// Two-sided p-value; absent with only two observations.
    pub p_value: Option<f64>,
    pub n: usize,
}

/// Pearson correlation of paired observations.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Result<Correlation, StatsError> {
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
    if negligible(sxx, &xs) || negligible(syy, &ys) {
        return Err(StatsError::degenerate("zero variance in input"));
    }
    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let df = n - 2;
    let p_value = if df == 0 {
        None
    } else {
        let rest = 1.0 - r * r;
        if rest <= 0.0 {
            Some(0.0)
        } else {
            Some(dist::student_t_two_sided(r * (df as f64 / rest).sqrt(), df as f64))
        }
    };
    Ok(Correlation { r, p_value, n })
}
