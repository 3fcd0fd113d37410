//!
//! healthdash statistics
//! ---------------------
//! Descriptive statistics used by the dashboard pages: Pearson correlation with a
//! two-sided t-test p-value, simple ordinary least squares, and low-degree polynomial
//! curve fits evaluated on a fixed grid.
//!
//! Every entry point takes plain `f64` slices and returns `Result<_, StatsError>`.
//! Too few observations and zero-variance inputs are reported as errors; nothing here
//! divides by zero or panics on data.

use serde::Serialize;

pub mod dist;
mod correlation;
mod polyfit;
mod regression;

pub use correlation::{pearson, Correlation};
pub use polyfit::{fit_curve, grid_optimum, linspace, polyfit, CurveFit, GridOptimum, Polynomial, MAX_DEGREE};
pub use regression::{ols, Regression};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    #[error("not enough data: need at least {needed} valid observations, found {found}")]
    InsufficientData { needed: usize, found: usize },
    #[error("cannot compute: {reason}")]
    DegenerateFit { reason: String },
    #[error("input lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}

impl StatsError {
    pub fn code(&self) -> &'static str {
        match self {
            StatsError::InsufficientData { .. } => "insufficient_data",
            StatsError::DegenerateFit { .. } => "degenerate_fit",
            StatsError::LengthMismatch { .. } => "length_mismatch",
        }
    }

    fn degenerate<S: Into<String>>(reason: S) -> Self { StatsError::DegenerateFit { reason: reason.into() } }
}

/// Drop pairs where either side is NaN or infinite.
pub(crate) fn finite_pairs(xs: &[f64], ys: &[f64]) -> Result<(Vec<f64>, Vec<f64>), StatsError> {
    if xs.len() != ys.len() {
        return Err(StatsError::LengthMismatch { left: xs.len(), right: ys.len() });
    }
    Ok(xs.iter().zip(ys).filter(|(x, y)| x.is_finite() && y.is_finite()).map(|(x, y)| (*x, *y)).unzip())
}

pub(crate) fn mean(v: &[f64]) -> f64 { v.iter().sum::<f64>() / v.len() as f64 }

/// Sum of squared deviations counts as zero when it is negligible next to the data's magnitude.
pub(crate) fn negligible(ss: f64, values: &[f64]) -> bool {
    let scale: f64 = values.iter().map(|v| v * v).sum();
    ss <= 1e-12 * scale.max(f64::MIN_POSITIVE)
}

/// Result of one statistic computed over a subset (income group, country).
#[derive(Debug, Clone, Serialize)]
pub struct GroupResult<T: Serialize> {
    pub group: String,
    pub n: usize,
    pub value: Option<T>,
    /// "N/A" reason when `value` is absent.
    pub note: Option<String>,
}

/// Run `stat` per group; groups with fewer than `min_rows` pairs, or whose statistic fails,
/// get a note instead of a value. Groups come back sorted by name.
pub fn by_group<T, F>(rows: impl IntoIterator<Item = (String, f64, f64)>, min_rows: usize, stat: F) -> Vec<GroupResult<T>>
where
    T: Serialize,
    F: Fn(&[f64], &[f64]) -> Result<T, StatsError>,
{
    let mut groups: std::collections::BTreeMap<String, (Vec<f64>, Vec<f64>)> = std::collections::BTreeMap::new();
    for (g, x, y) in rows {
        if !(x.is_finite() && y.is_finite()) { continue; }
        let entry = groups.entry(g).or_default();
        entry.0.push(x);
        entry.1.push(y);
    }
    groups
        .into_iter()
        .map(|(group, (xs, ys))| {
            let n = xs.len();
            let outcome = if n < min_rows {
                Err(StatsError::InsufficientData { needed: min_rows, found: n })
            } else {
                stat(&xs, &ys)
            };
            match outcome {
                Ok(v) => GroupResult { group, n, value: Some(v), note: None },
                Err(e) => GroupResult { group, n, value: None, note: Some(format!("N/A ({})", e)) },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_pairs_filters_nan() {
        let (x, y) = finite_pairs(&[1.0, f64::NAN, 3.0], &[1.0, 2.0, f64::INFINITY]).unwrap();
        assert_eq!(x, vec![1.0]);
        assert_eq!(y, vec![1.0]);
        assert!(matches!(finite_pairs(&[1.0], &[]), Err(StatsError::LengthMismatch { .. })));
    }

    #[test]
    fn by_group_reports_small_groups_as_na() {
        let rows = vec![
            ("High income".to_string(), 1.0, 2.0),
            ("High income".to_string(), 2.0, 4.1),
            ("High income".to_string(), 3.0, 5.9),
            ("Low income".to_string(), 1.0, 1.0),
            ("Low income".to_string(), 2.0, 3.0),
        ];
        let out = by_group(rows, 3, |x, y| pearson(x, y));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].group, "High income");
        assert!(out[0].value.as_ref().unwrap().r > 0.99);
        assert_eq!(out[1].n, 2);
        assert!(out[1].value.is_none());
        assert!(out[1].note.as_ref().unwrap().starts_with("N/A"));
    }
}
