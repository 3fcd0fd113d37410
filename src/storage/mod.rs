//!
//! healthdash storage module
//! -------------------------
//! Loads indicator extracts (CSV with leading metadata rows, or a workbook sheet) from a data
//! directory and validates them against their declared `SourceSpec`.
//!
//! Key responsibilities:
//! - Raw reads through a shared `TableCache`, so each distinct source is read once per process.
//! - Fail-fast schema checks: missing identifier/value columns, absent year columns and
//!   duplicate entity keys are reported before any reshaping happens.
//! - Entity metadata tables (region, income group) for enrichment joins.
//!
//! The public API centers around `SourceStore`, which owns the data root and the cache.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use polars::prelude::*;
use tracing::{debug, info};

pub mod cache;
pub mod schema;
mod io;

pub use cache::TableCache;
pub use schema::{Combine, MetadataSpec, MissingPolicy, RowBlock, SourceFormat, SourceLayout, SourceSpec, YearRange};

use crate::error::{DashError, DashResult};

/// Handle on the directory holding indicator extracts.
#[derive(Clone)]
pub struct SourceStore {
    root: PathBuf,
    cache: TableCache,
}

impl SourceStore {
    pub fn new<P: AsRef<Path>>(root: P, cache: TableCache) -> Self {
        Self { root: root.as_ref().to_path_buf(), cache }
    }

    pub fn cache(&self) -> &TableCache { &self.cache }

    fn resolve(&self, locator: &str) -> PathBuf { self.root.join(locator) }

    fn raw(&self, locator: &str, format: &SourceFormat) -> DashResult<Arc<DataFrame>> {
        let key = format.cache_key(locator);
        let path = self.resolve(locator);
        self.cache.get_or_load(&key, || {
            info!(target: "healthdash::storage", "loading source '{}' from {}", locator, path.display());
            io::read_raw(&path, locator, format)
        })
    }

    /// Load and validate an indicator source.
    pub fn load(&self, spec: &SourceSpec) -> DashResult<IndicatorTable> {
        let mut frame = self.raw(&spec.locator, &spec.format)?;
        if let Some(names) = &spec.header {
            frame = Arc::new(io::rename_leading(&frame, names, &spec.locator)?);
        }
        IndicatorTable::new(spec.clone(), frame)
    }

    /// Load an entity metadata table.
    pub fn load_metadata(&self, spec: &MetadataSpec) -> DashResult<MetadataTable> {
        let frame = self.raw(&spec.locator, &spec.format)?;
        MetadataTable::from_raw(spec, &frame)
    }
}

/// A loaded source that passed header validation. Cells are still strings.
#[derive(Clone)]
pub struct IndicatorTable {
    spec: SourceSpec,
    frame: Arc<DataFrame>,
    /// (column name, year) for wide layouts, in header order.
    year_columns: Vec<(String, i32)>,
}

impl IndicatorTable {
    pub fn new(spec: SourceSpec, frame: Arc<DataFrame>) -> DashResult<Self> {
        spec.check_shape().map_err(|detail| DashError::parse(&spec.locator, detail))?;
        let header: Vec<String> = frame.get_column_names().iter().map(|s| s.to_string()).collect();
        let missing = schema::missing_columns(&spec.key_columns(), &header);
        if !missing.is_empty() {
            return Err(DashError::missing_columns(&spec.locator, missing));
        }
        let year_columns: Vec<(String, i32)> = match &spec.layout {
            SourceLayout::Wide { years, .. } => {
                let cols: Vec<(String, i32)> = header
                    .iter()
                    .filter_map(|h| schema::header_year(h).filter(|y| years.contains(*y)).map(|y| (h.clone(), y)))
                    .collect();
                if cols.is_empty() {
                    return Err(DashError::parse(
                        &spec.locator,
                        format!("no year columns between {} and {}", years.start, years.end),
                    ));
                }
                let distinct: HashSet<i32> = cols.iter().map(|(_, y)| *y).collect();
                if distinct.len() != cols.len() {
                    return Err(DashError::parse(&spec.locator, "a year appears in more than one column"));
                }
                cols
            }
            SourceLayout::Long { .. } => Vec::new(),
        };
        let table = Self { spec, frame, year_columns };
        if table.spec.combine == Combine::Reject {
            table.check_unique_keys()?;
        }
        debug!(
            target: "healthdash::storage",
            "validated source '{}': rows={} year_columns={}",
            table.spec.locator, table.frame.height(), table.year_columns.len()
        );
        Ok(table)
    }

    pub fn spec(&self) -> &SourceSpec { &self.spec }

    pub fn frame(&self) -> &DataFrame { &self.frame }

    pub fn year_columns(&self) -> &[(String, i32)] { &self.year_columns }

    pub fn height(&self) -> usize { self.frame.height() }

    /// Column values as owned strings, `None` for nulls.
    pub(crate) fn strings(&self, column: &str) -> DashResult<Vec<Option<String>>> {
        string_column(&self.frame, column)
    }

    /// Identifier of every data row: the fixed entity, or the id column. Rows outside all
    /// declared row blocks come back as `None`.
    pub(crate) fn row_ids(&self) -> DashResult<Vec<Option<String>>> {
        let ids = match &self.spec.entity {
            Some(entity) => vec![Some(entity.clone()); self.frame.height()],
            None => self.strings(&self.spec.id_column)?,
        };
        if self.spec.row_blocks.is_empty() {
            return Ok(ids);
        }
        Ok(ids.into_iter().enumerate().map(|(row, id)| id.filter(|_| self.spec.block_of(row).is_some())).collect())
    }

    /// Per-row category from the category column or the row blocks.
    pub(crate) fn row_categories(&self) -> DashResult<Option<Vec<Option<String>>>> {
        if let Some(c) = &self.spec.category_column {
            return Ok(Some(self.strings(c)?));
        }
        if self.spec.row_blocks.is_empty() {
            return Ok(None);
        }
        Ok(Some((0..self.frame.height()).map(|row| self.spec.block_of(row).map(str::to_string)).collect()))
    }

    fn check_unique_keys(&self) -> DashResult<()> {
        let ids = self.row_ids()?;
        let cats = self.row_categories()?;
        let years = match &self.spec.layout {
            SourceLayout::Long { year_column, .. } => Some(self.strings(year_column)?),
            SourceLayout::Wide { .. } => None,
        };
        let mut seen: HashSet<(String, String, String)> = HashSet::with_capacity(ids.len());
        for (row, id) in ids.iter().enumerate() {
            let Some(id) = id.as_deref().map(str::trim).filter(|s| !s.is_empty()) else { continue };
            let cat = cats.as_ref().and_then(|c| c[row].clone()).unwrap_or_default();
            let year = years.as_ref().and_then(|y| y[row].clone()).unwrap_or_default();
            if !seen.insert((id.to_string(), cat.clone(), year.trim().to_string())) {
                let mut key = id.to_string();
                if !cat.is_empty() { key.push_str(&format!(" / {}", cat)); }
                if !year.is_empty() { key.push_str(&format!(" / {}", year.trim())); }
                return Err(DashError::DuplicateKey { locator: self.spec.locator.clone(), key });
            }
        }
        Ok(())
    }
}

/// Entity attributes keyed by identifier; columns `entity_id`, `region`, `income_group`.
#[derive(Clone)]
pub struct MetadataTable {
    frame: DataFrame,
}

impl MetadataTable {
    pub const ID: &'static str = "entity_id";
    pub const REGION: &'static str = "region";
    pub const INCOME_GROUP: &'static str = "income_group";

    fn from_raw(spec: &MetadataSpec, raw: &DataFrame) -> DashResult<Self> {
        let header: Vec<String> = raw.get_column_names().iter().map(|s| s.to_string()).collect();
        let missing = schema::missing_columns(&spec.required_columns(), &header);
        if !missing.is_empty() {
            return Err(DashError::missing_columns(&spec.locator, missing));
        }
        let ids = string_column(raw, &spec.id_column)?;
        let region = spec.region_column.as_deref().map(|c| string_column(raw, c)).transpose()?;
        let income = spec.income_group_column.as_deref().map(|c| string_column(raw, c)).transpose()?;

        let mut out_ids = Vec::new();
        let mut out_region = Vec::new();
        let mut out_income = Vec::new();
        let mut seen = HashSet::new();
        for (row, id) in ids.into_iter().enumerate() {
            let Some(id) = id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else { continue };
            if !seen.insert(id.clone()) {
                return Err(DashError::DuplicateKey { locator: spec.locator.clone(), key: id });
            }
            out_ids.push(id);
            out_region.push(region.as_ref().and_then(|r| non_blank(&r[row])));
            out_income.push(income.as_ref().and_then(|i| non_blank(&i[row])));
        }
        let mut columns: Vec<Column> = vec![Series::new(Self::ID.into(), out_ids).into()];
        if spec.region_column.is_some() {
            columns.push(Series::new(Self::REGION.into(), out_region).into());
        }
        if spec.income_group_column.is_some() {
            columns.push(Series::new(Self::INCOME_GROUP.into(), out_income).into());
        }
        Ok(Self { frame: DataFrame::new(columns)? })
    }

    pub fn frame(&self) -> &DataFrame { &self.frame }

    /// Attribute columns carried by this table (`region`, `income_group`).
    pub fn attributes(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .filter(|s| s != Self::ID)
            .collect()
    }
}

fn non_blank(v: &Option<String>) -> Option<String> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

pub(crate) fn string_column(df: &DataFrame, name: &str) -> DashResult<Vec<Option<String>>> {
    let col = df.column(name)?.cast(&DataType::String)?;
    Ok(col.str()?.into_iter().map(|v| v.map(|s| s.to_string())).collect())
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod storage_tests;
