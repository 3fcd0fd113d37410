use serde::Serialize;

use super::{finite_pairs, StatsError};

/// Least-squares polynomial in a centred and scaled variable `t = (x - center) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polynomial {
    /// Ascending powers of `t`.
    coeffs: Vec<f64>,
    center: f64,
    scale: f64,
}

impl Polynomial {
    pub fn degree(&self) -> usize { self.coeffs.len().saturating_sub(1) }

    pub fn eval(&self, x: f64) -> f64 {
        let t = (x - self.center) / self.scale;
        self.coeffs.iter().rev().fold(0.0, |acc, c| acc * t + c)
    }
}

/// Highest degree `polyfit` accepts.
pub const MAX_DEGREE: usize = 10;

/// Fit a polynomial of the given degree through the normal equations.
pub fn polyfit(xs: &[f64], ys: &[f64], degree: usize) -> Result<Polynomial, StatsError> {
    if degree > MAX_DEGREE {
        return Err(StatsError::degenerate(format!("degree {} exceeds the maximum of {}", degree, MAX_DEGREE)));
    }
    let (xs, ys) = finite_pairs(xs, ys)?;
    let terms = degree + 1;
    if xs.len() < terms {
        return Err(StatsError::InsufficientData { needed: terms, found: xs.len() });
    }
    let mut distinct: Vec<f64> = xs.clone();
    distinct.sort_by(|a, b| a.total_cmp(b));
    distinct.dedup();
    if distinct.len() < terms {
        return Err(StatsError::degenerate(format!(
            "{} distinct x values cannot determine a degree {} polynomial",
            distinct.len(),
            degree
        )));
    }
    let (lo, hi) = (distinct[0], distinct[distinct.len() - 1]);
    let center = (lo + hi) / 2.0;
    let scale = ((hi - lo) / 2.0).max(f64::MIN_POSITIVE);

    // A[i][j] = sum t^(i+j), b[i] = sum t^i * y
    let mut a = vec![vec![0.0; terms]; terms];
    let mut b = vec![0.0; terms];
    for (x, y) in xs.iter().zip(&ys) {
        let t = (x - center) / scale;
        let mut powers = vec![1.0; 2 * terms - 1];
        for k in 1..powers.len() {
            powers[k] = powers[k - 1] * t;
        }
        for i in 0..terms {
            b[i] += powers[i] * y;
            for j in 0..terms {
                a[i][j] += powers[i + j];
            }
        }
    }
    let coeffs = solve(a, b).ok_or_else(|| StatsError::degenerate("normal equations are singular"))?;
    Ok(Polynomial { coeffs, center, scale })
}

/// Gaussian elimination with partial pivoting. `None` when the system is singular.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    let max_abs = a.iter().flatten().fold(0.0_f64, |m, v| m.max(v.abs()));
    let tol = 1e-12 * max_abs.max(f64::MIN_POSITIVE);
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() <= tol {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let f = a[row][col] / a[col][col];
            if f == 0.0 { continue; }
            for k in col..n {
                a[row][k] -= f * a[col][k];
            }
            b[row] -= f * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}

/// `points` evenly spaced values from `lo` to `hi` inclusive.
pub fn linspace(lo: f64, hi: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (points - 1) as f64;
            let mut out: Vec<f64> = (0..points).map(|i| lo + step * i as f64).collect();
            out[points - 1] = hi;
            out
        }
    }
}

/// Grid point with the largest fitted value. Approximate: only as fine as the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridOptimum {
    pub x: f64,
    pub y: f64,
    pub grid_points: usize,
}

/// Evaluate `poly` on `linspace(lo, hi, points)` and return the first maximum.
pub fn grid_optimum(poly: &Polynomial, lo: f64, hi: f64, points: usize) -> Result<GridOptimum, StatsError> {
    let grid = linspace(lo, hi, points);
    let mut best: Option<(f64, f64)> = None;
    for x in grid {
        let y = poly.eval(x);
        if !y.is_finite() { continue; }
        if best.map_or(true, |(_, by)| y > by) {
            best = Some((x, y));
        }
    }
    let (x, y) = best.ok_or(StatsError::InsufficientData { needed: 1, found: 0 })?;
    Ok(GridOptimum { x, y, grid_points: points })
}

/// A polynomial fit, the fitted curve sampled over the data range, and its grid maximum.
#[derive(Debug, Clone, Serialize)]
pub struct CurveFit {
    pub polynomial: Polynomial,
    pub curve: Vec<(f64, f64)>,
    pub optimum: GridOptimum,
}

pub fn fit_curve(xs: &[f64], ys: &[f64], degree: usize, points: usize) -> Result<CurveFit, StatsError> {
    let polynomial = polyfit(xs, ys, degree)?;
    let (lo, hi) = xs
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let curve: Vec<(f64, f64)> = linspace(lo, hi, points).into_iter().map(|x| (x, polynomial.eval(x))).collect();
    let optimum = grid_optimum(&polynomial, lo, hi, points)?;
    Ok(CurveFit { polynomial, curve, optimum })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_fit_of_quadratic_peaks_at_right_edge() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 4.0, 9.0, 16.0, 25.0];
        let fit = fit_curve(&x, &y, 3, 100).unwrap();
        assert_eq!(fit.polynomial.degree(), 3);
        for (xi, yi) in x.iter().zip(&y) {
            assert!((fit.polynomial.eval(*xi) - yi).abs() < 1e-8);
        }
        let grid = linspace(1.0, 5.0, 100);
        let nearest = grid.iter().copied().min_by(|a, b| (a - 5.0).abs().total_cmp(&(b - 5.0).abs())).unwrap();
        assert_eq!(fit.optimum.x, nearest);
        assert!((fit.optimum.y - fit.polynomial.eval(nearest)).abs() < 1e-9);
        assert!((fit.optimum.y - 25.0).abs() < 1e-6);
        assert_eq!(fit.curve.len(), 100);
    }

    #[test]
    fn interior_maximum() {
        // Downward parabola peaking at x = 3
        let x: Vec<f64> = (0..=6).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| -(v - 3.0) * (v - 3.0) + 10.0).collect();
        let p = polyfit(&x, &y, 2).unwrap();
        let opt = grid_optimum(&p, 0.0, 6.0, 61).unwrap();
        assert!((opt.x - 3.0).abs() < 1e-9);
        assert!((opt.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn too_few_points() {
        let err = polyfit(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], 3).unwrap_err();
        assert_eq!(err, StatsError::InsufficientData { needed: 4, found: 3 });
    }

    #[test]
    fn degree_is_capped() {
        let x: Vec<f64> = (0..20).map(f64::from).collect();
        let err = polyfit(&x, &x, usize::MAX).unwrap_err();
        assert!(matches!(err, StatsError::DegenerateFit { .. }));
        assert!(polyfit(&x, &x, 2).is_ok());
    }

    #[test]
    fn repeated_x_is_degenerate() {
        let err = polyfit(&[1.0, 1.0, 2.0, 2.0, 2.0], &[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap_err();
        assert!(matches!(err, StatsError::DegenerateFit { .. }));
    }

    #[test]
    fn linspace_endpoints() {
        let g = linspace(0.0, 1.0, 5);
        assert_eq!(g, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        assert!(linspace(2.0, 3.0, 0).is_empty());
    }
}
