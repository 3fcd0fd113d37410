//! Wide -> long reshaping and cell coercion.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::{LongRecord, LongTable};
use crate::error::{DashError, DashResult};
use crate::storage::schema::header_year;
use crate::storage::{Combine, IndicatorTable, MissingPolicy, SourceLayout, SourceSpec};

/// Counts of cells that did not become values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReshapeReport {
    /// Cells that became long records.
    pub kept: usize,
    pub blank: usize,
    pub placeholders: usize,
    /// Non-numeric text that is not a known placeholder.
    pub unparseable: usize,
    /// Rows dropped because the identifier or the year was missing.
    pub skipped_rows: usize,
    /// Extra rows folded into an existing key by `Combine::Sum`.
    pub combined: usize,
}

impl ReshapeReport {
    /// Cells worth warning about; blanks are routine in these extracts.
    pub fn warnings(&self) -> usize { self.placeholders + self.unparseable }

    pub fn merge(&mut self, other: &ReshapeReport) {
        self.kept += other.kept;
        self.blank += other.blank;
        self.placeholders += other.placeholders;
        self.unparseable += other.unparseable;
        self.skipped_rows += other.skipped_rows;
        self.combined += other.combined;
    }
}

#[derive(Debug, Clone)]
pub struct Reshaped {
    /// One table per indicator the source produces, in declaration order.
    pub tables: Vec<LongTable>,
    pub report: ReshapeReport,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Cell {
    Value(f64),
    Blank,
    Placeholder,
    Unparseable,
}

fn classify(spec: &SourceSpec, raw: Option<&str>) -> Cell {
    let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else { return Cell::Blank };
    if spec.is_placeholder(text) {
        return Cell::Placeholder;
    }
    match parse_number(text) {
        Some(v) => Cell::Value(v),
        None => Cell::Unparseable,
    }
}

/// Parse a numeric cell, accepting thousand separators ("1,234.5").
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let t = text.trim();
    let parsed = if t.contains(',') { t.replace(',', "").parse::<f64>() } else { t.parse::<f64>() };
    parsed.ok().filter(|v| v.is_finite())
}

/// Accumulates values per key in key order.
struct Accumulator<'a> {
    spec: &'a SourceSpec,
    values: BTreeMap<(String, Option<String>, i32), (String, f64)>,
    report: ReshapeReport,
}

impl<'a> Accumulator<'a> {
    fn new(spec: &'a SourceSpec) -> Self {
        Self { spec, values: BTreeMap::new(), report: ReshapeReport::default() }
    }

    fn push(&mut self, id: &str, name: &str, category: Option<String>, year: i32, cell: Cell) -> DashResult<()> {
        let value = match (cell, self.spec.missing) {
            (Cell::Value(v), _) => v,
            (Cell::Blank, MissingPolicy::ZeroFill) | (Cell::Placeholder, MissingPolicy::ZeroFill) => {
                if cell == Cell::Placeholder {
                    self.report.placeholders += 1;
                }
                0.0
            }
            (Cell::Blank, MissingPolicy::Exclude) => {
                self.report.blank += 1;
                return Ok(());
            }
            (Cell::Placeholder, MissingPolicy::Exclude) => {
                self.report.placeholders += 1;
                return Ok(());
            }
            (Cell::Unparseable, _) => {
                self.report.unparseable += 1;
                return Ok(());
            }
        };
        let value = value * self.spec.scale.unwrap_or(1.0);
        let key = (id.to_string(), category, year);
        match self.values.get_mut(&key) {
            None => {
                self.values.insert(key, (name.to_string(), value));
                self.report.kept += 1;
            }
            Some(slot) if self.spec.combine == Combine::Sum => {
                slot.1 += value;
                self.report.combined += 1;
            }
            Some(_) => {
                let mut shown = key.0.clone();
                if let Some(c) = &key.1 {
                    shown.push_str(&format!(" / {}", c));
                }
                shown.push_str(&format!(" / {}", key.2));
                return Err(DashError::DuplicateKey { locator: self.spec.locator.clone(), key: shown });
            }
        }
        Ok(())
    }

    fn finish(self, indicator: &str) -> DashResult<(LongTable, ReshapeReport)> {
        let records: Vec<LongRecord> = self
            .values
            .into_iter()
            .map(|((entity_id, category, year), (entity_name, value))| LongRecord {
                entity_id,
                entity_name,
                category,
                year,
                value,
            })
            .collect();
        let table = LongTable::from_records(indicator, self.spec.has_category(), &records)?;
        Ok((table, self.report))
    }
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Turn a validated source into long tables, one per indicator it declares.
pub fn reshape(table: &IndicatorTable) -> DashResult<Reshaped> {
    let spec = table.spec();
    let ids = table.row_ids()?;
    let names = match &spec.name_column {
        Some(c) => table.strings(c)?,
        None => ids.clone(),
    };
    let cats = table.row_categories()?;
    let category_of = |row: usize| cats.as_ref().and_then(|c| non_blank(&c[row]).map(str::to_string));

    let mut tables = Vec::new();
    let mut report = ReshapeReport::default();
    match &spec.layout {
        SourceLayout::Wide { indicator, .. } => {
            let mut acc = Accumulator::new(spec);
            let year_cells: Vec<(i32, Vec<Option<String>>)> = table
                .year_columns()
                .iter()
                .map(|(col, year)| Ok((*year, table.strings(col)?)))
                .collect::<DashResult<_>>()?;
            for row in 0..ids.len() {
                let Some(id) = non_blank(&ids[row]) else {
                    acc.report.skipped_rows += 1;
                    continue;
                };
                let name = non_blank(&names[row]).unwrap_or(id);
                let category = category_of(row);
                for (year, cells) in &year_cells {
                    let cell = classify(spec, cells[row].as_deref());
                    acc.push(id, name, category.clone(), *year, cell)?;
                }
            }
            let (t, r) = acc.finish(indicator)?;
            tables.push(t);
            report.merge(&r);
        }
        SourceLayout::Long { year_column, value_columns, years: range, stack_as } => {
            let years: Vec<Option<i32>> = table
                .strings(year_column)?
                .iter()
                .map(|y| non_blank(y).and_then(header_year).filter(|y| range.map_or(true, |r| r.contains(*y))))
                .collect();
            let mut stacked = stack_as.as_ref().map(|_| Accumulator::new(spec));
            for value_column in value_columns {
                let values = table.strings(value_column)?;
                let mut own = Accumulator::new(spec);
                let acc = stacked.as_mut().unwrap_or(&mut own);
                for row in 0..ids.len() {
                    let (Some(id), Some(year)) = (non_blank(&ids[row]), years[row]) else {
                        acc.report.skipped_rows += 1;
                        continue;
                    };
                    let name = non_blank(&names[row]).unwrap_or(id);
                    let category = match stack_as {
                        Some(_) => Some(value_column.clone()),
                        None => category_of(row),
                    };
                    let cell = classify(spec, values[row].as_deref());
                    acc.push(id, name, category, year, cell)?;
                }
                if stacked.is_none() {
                    let (t, r) = own.finish(value_column)?;
                    tables.push(t);
                    report.merge(&r);
                }
            }
            if let (Some(acc), Some(name)) = (stacked, stack_as) {
                let (t, r) = acc.finish(name)?;
                tables.push(t);
                report.merge(&r);
            }
        }
    }
    debug!(
        target: "healthdash::pipeline",
        "reshaped '{}': tables={} kept={} placeholders={} unparseable={} combined={}",
        spec.locator, tables.len(), report.kept, report.placeholders, report.unparseable, report.combined
    );
    Ok(Reshaped { tables, report })
}

#[cfg(test)]
#[path = "reshape_tests.rs"]
mod reshape_tests;
