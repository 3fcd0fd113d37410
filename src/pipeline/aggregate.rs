//! Aggregations used by individual pages: top-N entity selection and per-year trends.

use polars::prelude::*;
use serde::Serialize;

use super::{JoinedTable, ENTITY_NAME};
use crate::error::{DashError, DashResult};
use crate::storage::string_column;

/// Entity names with the highest mean of `column`, best first. Ties break by name.
pub fn top_entities_by_mean(table: &JoinedTable, column: &str, n: usize) -> DashResult<Vec<String>> {
    if !table.has_column(column) {
        return Err(DashError::InvalidPage(format!("unknown column '{}'", column)));
    }
    let ranked = table
        .frame()
        .clone()
        .lazy()
        .group_by([col(ENTITY_NAME)])
        .agg([col(column).mean().alias("__mean")])
        .filter(col("__mean").is_not_null())
        .sort_by_exprs(
            vec![col("__mean"), col(ENTITY_NAME)],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .limit(n as IdxSize)
        .collect()?;
    Ok(string_column(&ranked, ENTITY_NAME)?.into_iter().flatten().collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub year: i32,
    pub mean: f64,
    pub n: usize,
}

/// Mean of `column` per year across the selected entities, ascending by year.
pub fn mean_by_year(table: &JoinedTable, column: &str) -> DashResult<Vec<TrendPoint>> {
    let years = table.years()?;
    let values = table.numbers(column)?;
    let mut acc: std::collections::BTreeMap<i32, (f64, usize)> = std::collections::BTreeMap::new();
    for (year, value) in years.into_iter().zip(values) {
        let (Some(year), Some(value)) = (year, value) else { continue };
        if !value.is_finite() { continue; }
        let slot = acc.entry(year).or_insert((0.0, 0));
        slot.0 += value;
        slot.1 += 1;
    }
    Ok(acc.into_iter().map(|(year, (sum, n))| TrendPoint { year, mean: sum / n as f64, n }).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{inner_join, LongRecord, LongTable};

    fn rec(name: &str, year: i32, value: f64) -> LongRecord {
        LongRecord { entity_id: name.to_uppercase(), entity_name: name.into(), category: None, year, value }
    }

    fn joined() -> JoinedTable {
        let spend = vec![
            rec("Aland", 2000, 10.0),
            rec("Aland", 2001, 30.0),
            rec("Borduria", 2000, 50.0),
            rec("Borduria", 2001, 50.0),
            rec("Carpania", 2000, 5.0),
        ];
        let cases = vec![
            rec("Aland", 2000, 2.0),
            rec("Aland", 2001, 0.0),
            rec("Borduria", 2000, 5.0),
            rec("Borduria", 2001, 10.0),
            rec("Carpania", 2000, 1.0),
        ];
        inner_join(&[
            LongTable::from_records("Spend", false, &spend).unwrap(),
            LongTable::from_records("Cases", false, &cases).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn top_n_by_mean() {
        let top = top_entities_by_mean(&joined(), "Spend", 2).unwrap();
        assert_eq!(top, vec!["Borduria".to_string(), "Aland".to_string()]);
        assert!(top_entities_by_mean(&joined(), "Nope", 2).is_err());
    }

    #[test]
    fn per_year_means() {
        let trend = mean_by_year(&joined(), "Spend").unwrap();
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0], TrendPoint { year: 2000, mean: 65.0 / 3.0, n: 3 });
        assert_eq!(trend[1], TrendPoint { year: 2001, mean: 40.0, n: 2 });
    }
}
