//!
//! healthdash pipeline
//! -------------------
//! Stages between a loaded source and a rendered page:
//!
//!   reshape   wide year columns -> long (entity, year, value) tables
//!   join      inner join of long tables on (entity_id, year[, category]), metadata enrichment
//!   filter    year range, entity allow-list, category equality
//!   aggregate top-N entities and per-year means
//!   run       one parameterised `Pipeline` driving the stages for a page request
//!
//! Every stage takes its input by shared reference and returns a new table.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::Serialize;

use crate::error::{DashError, DashResult};
use crate::storage::string_column;

pub mod aggregate;
pub mod filter;
pub mod join;
pub mod reshape;
pub mod run;

pub use filter::{CategoryMatch, FilterSpec};
pub use join::{enrich, inner_join};
pub use reshape::{reshape, ReshapeReport, Reshaped};
pub use run::{Notice, NoticeLevel, PageOutcome, PageParams, Pipeline, Summary};

pub const ENTITY_ID: &str = "entity_id";
pub const ENTITY_NAME: &str = "entity_name";
pub const CATEGORY: &str = "category";
pub const YEAR: &str = "year";

/// Column names that can never be used as an indicator name.
pub(crate) const RESERVED: [&str; 6] = [ENTITY_ID, ENTITY_NAME, CATEGORY, YEAR, "region", "income_group"];

/// One observation of one indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRecord {
    pub entity_id: String,
    pub entity_name: String,
    pub category: Option<String>,
    pub year: i32,
    pub value: f64,
}

/// A single indicator in long form: `entity_id`, `entity_name`, optional `category`, `year`,
/// and the indicator column named after the indicator.
#[derive(Debug, Clone)]
pub struct LongTable {
    indicator: String,
    frame: DataFrame,
}

impl LongTable {
    pub fn from_records(indicator: &str, with_category: bool, records: &[LongRecord]) -> DashResult<Self> {
        if RESERVED.contains(&indicator) {
            return Err(DashError::InvalidPage(format!("'{}' is a reserved column name", indicator)));
        }
        let mut columns: Vec<Column> = vec![
            Series::new(ENTITY_ID.into(), records.iter().map(|r| r.entity_id.as_str()).collect::<Vec<_>>()).into(),
            Series::new(ENTITY_NAME.into(), records.iter().map(|r| r.entity_name.as_str()).collect::<Vec<_>>()).into(),
        ];
        if with_category {
            let cats: Vec<Option<&str>> = records.iter().map(|r| r.category.as_deref()).collect();
            columns.push(Series::new(CATEGORY.into(), cats).into());
        }
        columns.push(Series::new(YEAR.into(), records.iter().map(|r| r.year).collect::<Vec<i32>>()).into());
        columns.push(Series::new(indicator.into(), records.iter().map(|r| r.value).collect::<Vec<f64>>()).into());
        Ok(Self { indicator: indicator.to_string(), frame: DataFrame::new(columns)? })
    }

    pub fn indicator(&self) -> &str { &self.indicator }

    pub fn frame(&self) -> &DataFrame { &self.frame }

    pub fn height(&self) -> usize { self.frame.height() }

    pub fn is_empty(&self) -> bool { self.frame.height() == 0 }

    pub fn has_category(&self) -> bool { has_column(&self.frame, CATEGORY) }

    pub fn records(&self) -> DashResult<Vec<LongRecord>> {
        let ids = string_column(&self.frame, ENTITY_ID)?;
        let names = string_column(&self.frame, ENTITY_NAME)?;
        let cats = if self.has_category() { Some(string_column(&self.frame, CATEGORY)?) } else { None };
        let years = i32_column(&self.frame, YEAR)?;
        let values = f64_column(&self.frame, &self.indicator)?;
        let mut out = Vec::with_capacity(ids.len());
        for row in 0..ids.len() {
            let (Some(entity_id), Some(year), Some(value)) = (ids[row].clone(), years[row], values[row]) else { continue };
            out.push(LongRecord {
                entity_name: names[row].clone().unwrap_or_else(|| entity_id.clone()),
                entity_id,
                category: cats.as_ref().and_then(|c| c[row].clone()),
                year,
                value,
            });
        }
        Ok(out)
    }

    /// Back to one row per (entity_id, category) with a value per year.
    pub fn pivot(&self) -> DashResult<BTreeMap<(String, Option<String>), BTreeMap<i32, f64>>> {
        let mut out: BTreeMap<(String, Option<String>), BTreeMap<i32, f64>> = BTreeMap::new();
        for r in self.records()? {
            out.entry((r.entity_id, r.category)).or_default().insert(r.year, r.value);
        }
        Ok(out)
    }
}

/// Indicator tables joined on entity and year, optionally enriched with metadata columns.
#[derive(Debug, Clone)]
pub struct JoinedTable {
    frame: DataFrame,
    indicators: Vec<String>,
    attributes: Vec<String>,
}

impl JoinedTable {
    pub(crate) fn from_parts(frame: DataFrame, indicators: Vec<String>, attributes: Vec<String>) -> Self {
        Self { frame, indicators, attributes }
    }

    /// Same indicators and attributes over a different set of rows.
    pub(crate) fn with_frame(&self, frame: DataFrame) -> Self {
        Self { frame, indicators: self.indicators.clone(), attributes: self.attributes.clone() }
    }

    pub fn frame(&self) -> &DataFrame { &self.frame }

    pub fn indicators(&self) -> &[String] { &self.indicators }

    /// Metadata columns joined in by `enrich`.
    pub fn attributes(&self) -> &[String] { &self.attributes }

    pub fn height(&self) -> usize { self.frame.height() }

    pub fn is_empty(&self) -> bool { self.frame.height() == 0 }

    pub fn has_column(&self, name: &str) -> bool { has_column(&self.frame, name) }

    pub fn column_names(&self) -> Vec<String> {
        self.frame.get_column_names().iter().map(|s| s.to_string()).collect()
    }

    pub fn strings(&self, column: &str) -> DashResult<Vec<Option<String>>> {
        self.require(column)?;
        string_column(&self.frame, column)
    }

    pub fn numbers(&self, column: &str) -> DashResult<Vec<Option<f64>>> {
        self.require(column)?;
        f64_column(&self.frame, column)
    }

    pub fn years(&self) -> DashResult<Vec<Option<i32>>> { i32_column(&self.frame, YEAR) }

    /// Distinct entity names in first-seen order.
    pub fn entity_names(&self) -> DashResult<Vec<String>> {
        let mut seen = std::collections::HashSet::new();
        Ok(string_column(&self.frame, ENTITY_NAME)?
            .into_iter()
            .flatten()
            .filter(|n| seen.insert(n.clone()))
            .collect())
    }

    /// Rows where both columns are present.
    pub fn pairs(&self, x: &str, y: &str) -> DashResult<(Vec<f64>, Vec<f64>)> {
        let xs = self.numbers(x)?;
        let ys = self.numbers(y)?;
        Ok(xs.into_iter().zip(ys).filter_map(|(a, b)| Some((a?, b?))).unzip())
    }

    /// `(group, x, y)` for rows where the group label and both values are present.
    pub fn grouped_pairs(&self, group: &str, x: &str, y: &str) -> DashResult<Vec<(String, f64, f64)>> {
        let gs = self.strings(group)?;
        let xs = self.numbers(x)?;
        let ys = self.numbers(y)?;
        Ok(gs
            .into_iter()
            .zip(xs.into_iter().zip(ys))
            .filter_map(|(g, (a, b))| Some((g?, a?, b?)))
            .collect())
    }

    fn require(&self, column: &str) -> DashResult<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(DashError::InvalidPage(format!("unknown column '{}'", column)))
        }
    }
}

pub(crate) fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

pub(crate) fn f64_column(df: &DataFrame, name: &str) -> DashResult<Vec<Option<f64>>> {
    let col = df.column(name)?.cast(&DataType::Float64)?;
    Ok(col.f64()?.into_iter().collect())
}

pub(crate) fn i32_column(df: &DataFrame, name: &str) -> DashResult<Vec<Option<i32>>> {
    let col = df.column(name)?.cast(&DataType::Int32)?;
    Ok(col.i32()?.into_iter().collect())
}

/// Stable row order: entity, category when present, then year.
pub(crate) fn sort_rows(df: DataFrame) -> DashResult<DataFrame> {
    let mut by = vec![col(ENTITY_ID)];
    if has_column(&df, CATEGORY) {
        by.push(col(CATEGORY));
    }
    by.push(col(YEAR));
    Ok(df.lazy().sort_by_exprs(by, SortMultipleOptions::default().with_maintain_order(true)).collect()?)
}
