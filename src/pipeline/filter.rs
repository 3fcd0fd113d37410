//! Row selection over a joined table. All criteria combine with AND.

use std::collections::HashSet;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::{JoinedTable, ENTITY_ID, ENTITY_NAME, YEAR};
use crate::error::{DashError, DashResult};
use crate::storage::{string_column, YearRange};

/// Equality on a text column such as `category`, `region` or `income_group`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMatch {
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Inclusive; all years when unset.
    #[serde(default)]
    pub years: Option<YearRange>,
    /// Entity names or identifiers. `Some(vec![])` selects nothing.
    #[serde(default)]
    pub entities: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<CategoryMatch>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool { self.years.is_none() && self.entities.is_none() && self.category.is_none() }

    /// Fields set in `other` replace ours.
    pub fn overridden_by(&self, other: &FilterSpec) -> FilterSpec {
        FilterSpec {
            years: other.years.or(self.years),
            entities: other.entities.clone().or_else(|| self.entities.clone()),
            category: other.category.clone().or_else(|| self.category.clone()),
        }
    }
}

pub fn apply(table: &JoinedTable, spec: &FilterSpec) -> DashResult<JoinedTable> {
    if spec.is_empty() {
        return Ok(table.clone());
    }
    let mut lf = table.frame().clone().lazy();
    if let Some(range) = spec.years {
        lf = lf.filter(col(YEAR).gt_eq(lit(range.start)).and(col(YEAR).lt_eq(lit(range.end))));
    }
    if let Some(m) = &spec.category {
        if !table.has_column(&m.column) {
            return Err(DashError::InvalidPage(format!("cannot filter on unknown column '{}'", m.column)));
        }
        lf = lf.filter(col(m.column.as_str()).eq(lit(m.value.clone())));
    }
    let mut df = lf.collect()?;

    if let Some(allowed) = &spec.entities {
        let allowed: HashSet<&str> = allowed.iter().map(|s| s.trim()).collect();
        let ids = string_column(&df, ENTITY_ID)?;
        let names = string_column(&df, ENTITY_NAME)?;
        let mask: Vec<bool> = ids
            .iter()
            .zip(&names)
            .map(|(id, name)| {
                id.as_deref().is_some_and(|v| allowed.contains(v)) || name.as_deref().is_some_and(|v| allowed.contains(v))
            })
            .collect();
        df = df.filter(&BooleanChunked::from_slice("".into(), &mask))?;
    }
    Ok(table.with_frame(df))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{inner_join, LongRecord, LongTable};

    fn table() -> JoinedTable {
        let mut recs = Vec::new();
        for (id, name) in [("JPN", "Japan"), ("IND", "India"), ("DZA", "Algeria")] {
            for year in 2000..=2005 {
                recs.push(LongRecord {
                    entity_id: id.into(),
                    entity_name: name.into(),
                    category: None,
                    year,
                    value: year as f64,
                });
            }
        }
        inner_join(&[LongTable::from_records("V", false, &recs).unwrap()]).unwrap()
    }

    #[test]
    fn year_range_is_inclusive() {
        let spec = FilterSpec { years: Some(YearRange::new(2001, 2003)), ..Default::default() };
        let out = apply(&table(), &spec).unwrap();
        assert_eq!(out.height(), 9);
        let years: HashSet<i32> = out.years().unwrap().into_iter().flatten().collect();
        assert_eq!(years, HashSet::from([2001, 2002, 2003]));
    }

    #[test]
    fn empty_allow_list_selects_nothing() {
        let spec = FilterSpec { entities: Some(vec![]), ..Default::default() };
        let out = apply(&table(), &spec).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.indicators(), table().indicators());
    }

    #[test]
    fn entities_match_name_or_id() {
        let spec = FilterSpec { entities: Some(vec!["Japan".into(), "DZA".into()]), ..Default::default() };
        let out = apply(&table(), &spec).unwrap();
        assert_eq!(out.entity_names().unwrap(), vec!["Algeria".to_string(), "Japan".to_string()]);
    }

    #[test]
    fn criteria_combine_with_and() {
        let spec = FilterSpec {
            years: Some(YearRange::new(2005, 2010)),
            entities: Some(vec!["India".into()]),
            category: None,
        };
        let out = apply(&table(), &spec).unwrap();
        assert_eq!(out.height(), 1);
        assert_eq!(out.numbers("V").unwrap(), vec![Some(2005.0)]);
    }

    #[test]
    fn unknown_category_column() {
        let spec = FilterSpec {
            category: Some(CategoryMatch { column: "income_group".into(), value: "High income".into() }),
            ..Default::default()
        };
        assert!(matches!(apply(&table(), &spec), Err(DashError::InvalidPage(_))));
    }

    #[test]
    fn params_override_defaults() {
        let base = FilterSpec { entities: Some(vec!["Japan".into()]), years: Some(YearRange::new(2000, 2001)), category: None };
        let user = FilterSpec { entities: Some(vec!["India".into()]), ..Default::default() };
        let merged = base.overridden_by(&user);
        assert_eq!(merged.entities, Some(vec!["India".to_string()]));
        assert_eq!(merged.years, Some(YearRange::new(2000, 2001)));
    }
}
