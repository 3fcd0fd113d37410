//! Declared shapes of indicator and metadata sources.
//!
//! Every source names the columns it must carry. The loader checks the header against
//! these declarations before any reshaping so that a wrong file fails with the list of
//! missing columns instead of producing an empty chart.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inclusive year interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        if start <= end { Self { start, end } } else { Self { start: end, end: start } }
    }

    pub fn contains(&self, year: i32) -> bool { year >= self.start && year <= self.end }

    pub fn years(&self) -> impl Iterator<Item = i32> { self.start..=self.end }
}

/// World Bank extracts cover 2000..=2022 in every page that melts them.
impl Default for YearRange {
    fn default() -> Self { Self { start: 2000, end: 2022 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceFormat {
    /// Comma separated text; `skip_rows` metadata lines precede the header.
    Csv {
        #[serde(default)]
        skip_rows: usize,
    },
    /// Workbook sheet; the first sheet when `sheet` is unset.
    Excel {
        #[serde(default)]
        sheet: Option<String>,
        #[serde(default)]
        skip_rows: usize,
    },
}

impl Default for SourceFormat {
    fn default() -> Self { SourceFormat::Csv { skip_rows: 0 } }
}

impl SourceFormat {
    /// Cache key for a locator read with this format.
    pub fn cache_key(&self, locator: &str) -> String {
        match self {
            SourceFormat::Csv { skip_rows } => format!("{}#skip={}", locator, skip_rows),
            SourceFormat::Excel { sheet, skip_rows } => {
                format!("{}#sheet={}#skip={}", locator, sheet.as_deref().unwrap_or("<first>"), skip_rows)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceLayout {
    /// One column per year; values land in the indicator column `indicator`.
    Wide {
        #[serde(default)]
        years: YearRange,
        indicator: String,
    },
    /// Already long: a year column plus one or more value columns, each its own indicator.
    Long {
        year_column: String,
        value_columns: Vec<String>,
        /// Rows whose year falls outside are skipped.
        #[serde(default)]
        years: Option<YearRange>,
        /// Fold every value column into one indicator of this name, with the source column
        /// name as the row's category.
        #[serde(default)]
        stack_as: Option<String>,
    },
}

/// Consecutive data rows `start..end` (0-based, after the header) that share a category,
/// for workbooks that stack several tables under one header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowBlock {
    pub label: String,
    pub start: usize,
    pub end: usize,
}

impl RowBlock {
    pub fn new(label: &str, start: usize, end: usize) -> Self { Self { label: label.to_string(), start, end } }
}

/// What to do with several rows sharing one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combine {
    #[default]
    Reject,
    Sum,
}

/// Treatment of blank and placeholder cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    #[default]
    Exclude,
    ZeroFill,
}

pub fn default_placeholders() -> Vec<String> {
    ["-", "-.0", "..", "no data", "n/a"].iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Path relative to the data directory.
    pub locator: String,
    #[serde(default)]
    pub format: SourceFormat,
    /// Ignored when `entity` is set.
    #[serde(default)]
    pub id_column: String,
    /// Defaults to the id column.
    #[serde(default)]
    pub name_column: Option<String>,
    /// The whole source describes this one entity (a regional or global aggregate).
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub category_column: Option<String>,
    #[serde(default)]
    pub row_blocks: Vec<RowBlock>,
    /// Replacement names for the leading header cells, in order.
    #[serde(default)]
    pub header: Option<Vec<String>>,
    pub layout: SourceLayout,
    #[serde(default = "default_placeholders")]
    pub placeholders: Vec<String>,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub combine: Combine,
    #[serde(default)]
    pub missing: MissingPolicy,
}

impl SourceSpec {
    pub fn wide(locator: &str, format: SourceFormat, id_column: &str, indicator: &str) -> Self {
        Self {
            locator: locator.to_string(),
            format,
            id_column: id_column.to_string(),
            name_column: None,
            entity: None,
            category_column: None,
            row_blocks: Vec::new(),
            header: None,
            layout: SourceLayout::Wide { years: YearRange::default(), indicator: indicator.to_string() },
            placeholders: default_placeholders(),
            scale: None,
            combine: Combine::Reject,
            missing: MissingPolicy::Exclude,
        }
    }

    pub fn long(locator: &str, format: SourceFormat, id_column: &str, year_column: &str, value_columns: &[&str]) -> Self {
        Self {
            locator: locator.to_string(),
            format,
            id_column: id_column.to_string(),
            name_column: None,
            entity: None,
            category_column: None,
            row_blocks: Vec::new(),
            header: None,
            layout: SourceLayout::Long {
                year_column: year_column.to_string(),
                value_columns: value_columns.iter().map(|s| s.to_string()).collect(),
                years: None,
                stack_as: None,
            },
            placeholders: default_placeholders(),
            scale: None,
            combine: Combine::Reject,
            missing: MissingPolicy::Exclude,
        }
    }

    pub fn with_name_column(mut self, name: &str) -> Self { self.name_column = Some(name.to_string()); self }
    pub fn with_category_column(mut self, name: &str) -> Self { self.category_column = Some(name.to_string()); self }
    pub fn with_years(mut self, range: YearRange) -> Self {
        match &mut self.layout {
            SourceLayout::Wide { years, .. } => *years = range,
            SourceLayout::Long { years, .. } => *years = Some(range),
        }
        self
    }
    pub fn with_entity(mut self, entity: &str) -> Self { self.entity = Some(entity.to_string()); self }
    pub fn with_row_blocks(mut self, blocks: Vec<RowBlock>) -> Self { self.row_blocks = blocks; self }
    pub fn with_header(mut self, names: &[&str]) -> Self {
        self.header = Some(names.iter().map(|s| s.to_string()).collect());
        self
    }
    pub fn stacked_as(mut self, indicator: &str) -> Self {
        if let SourceLayout::Long { stack_as, .. } = &mut self.layout { *stack_as = Some(indicator.to_string()); }
        self
    }
    pub fn with_scale(mut self, factor: f64) -> Self { self.scale = Some(factor); self }
    pub fn with_combine(mut self, combine: Combine) -> Self { self.combine = combine; self }
    pub fn with_missing(mut self, missing: MissingPolicy) -> Self { self.missing = missing; self }

    pub fn name_column(&self) -> &str { self.name_column.as_deref().unwrap_or(&self.id_column) }

    pub fn cache_key(&self) -> String { self.format.cache_key(&self.locator) }

    /// Names of the indicator columns this source produces once reshaped.
    pub fn indicators(&self) -> Vec<String> {
        match &self.layout {
            SourceLayout::Wide { indicator, .. } => vec![indicator.clone()],
            SourceLayout::Long { stack_as: Some(name), .. } => vec![name.clone()],
            SourceLayout::Long { value_columns, .. } => value_columns.clone(),
        }
    }

    /// Whether reshaped rows carry a category, from a column, row blocks or stacking.
    pub fn has_category(&self) -> bool {
        self.category_column.is_some()
            || !self.row_blocks.is_empty()
            || matches!(self.layout, SourceLayout::Long { stack_as: Some(_), .. })
    }

    /// Category label of data row `row` under `row_blocks`; `None` when the row is in no block.
    pub fn block_of(&self, row: usize) -> Option<&str> {
        self.row_blocks.iter().find(|b| row >= b.start && row < b.end).map(|b| b.label.as_str())
    }

    /// Reject option combinations that would give a row two categories or no identifier.
    pub fn check_shape(&self) -> Result<(), String> {
        let sources = [
            self.category_column.is_some(),
            !self.row_blocks.is_empty(),
            matches!(self.layout, SourceLayout::Long { stack_as: Some(_), .. }),
        ];
        if sources.iter().filter(|s| **s).count() > 1 {
            return Err("only one of category_column, row_blocks and stack_as may be set".into());
        }
        if self.entity.is_none() && self.id_column.trim().is_empty() {
            return Err("id_column is required unless entity is set".into());
        }
        if let Some(b) = self.row_blocks.iter().find(|b| b.start >= b.end) {
            return Err(format!("row block '{}' is empty ({}..{})", b.label, b.start, b.end));
        }
        Ok(())
    }

    /// Identifier-like columns that must be present regardless of layout.
    pub fn key_columns(&self) -> Vec<String> {
        let mut cols = Vec::new();
        if self.entity.is_none() { cols.push(self.id_column.clone()); }
        if let Some(n) = &self.name_column { cols.push(n.clone()); }
        if let Some(c) = &self.category_column { cols.push(c.clone()); }
        if let SourceLayout::Long { year_column, value_columns, .. } = &self.layout {
            cols.push(year_column.clone());
            cols.extend(value_columns.iter().cloned());
        }
        cols
    }

    pub fn is_placeholder(&self, cell: &str) -> bool {
        let t = cell.trim();
        self.placeholders.iter().any(|p| p.eq_ignore_ascii_case(t))
    }
}

/// Entity-level attributes joined onto indicator rows by identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataSpec {
    pub locator: String,
    #[serde(default)]
    pub format: SourceFormat,
    pub id_column: String,
    #[serde(default)]
    pub region_column: Option<String>,
    #[serde(default)]
    pub income_group_column: Option<String>,
}

impl MetadataSpec {
    pub fn cache_key(&self) -> String { self.format.cache_key(&self.locator) }

    pub fn required_columns(&self) -> Vec<String> {
        let mut cols = vec![self.id_column.clone()];
        if let Some(r) = &self.region_column { cols.push(r.clone()); }
        if let Some(i) = &self.income_group_column { cols.push(i.clone()); }
        cols
    }
}

/// Parse a header cell as a year. Workbooks often yield "2000" or "2000.0".
pub fn header_year(name: &str) -> Option<i32> {
    let t = name.trim();
    if let Ok(y) = t.parse::<i32>() { return Some(y); }
    match t.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.abs() < 100_000.0 => Some(f as i32),
        _ => None,
    }
}

/// Declared columns absent from `header`, in declaration order.
pub fn missing_columns(required: &[String], header: &[String]) -> Vec<String> {
    let present: BTreeSet<&str> = header.iter().map(|s| s.as_str()).collect();
    let mut seen = BTreeSet::new();
    required
        .iter()
        .filter(|c| !present.contains(c.as_str()) && seen.insert(c.as_str()))
        .cloned()
        .collect()
}
