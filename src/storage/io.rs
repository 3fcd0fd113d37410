use std::collections::HashSet;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;
use tracing::debug;

use super::schema::SourceFormat;
use crate::error::{DashError, DashResult};

/// Read a source into a frame whose columns are all strings with trimmed names.
///
/// Values stay untyped here; the reshaper decides what counts as a number.
pub(crate) fn read_raw(path: &Path, locator: &str, format: &SourceFormat) -> DashResult<DataFrame> {
    if !path.is_file() {
        return Err(DashError::SourceNotFound { locator: locator.to_string() });
    }
    let df = match format {
        SourceFormat::Csv { skip_rows } => read_csv(path, *skip_rows)?,
        SourceFormat::Excel { sheet, skip_rows } => read_excel(path, locator, sheet.as_deref(), *skip_rows)?,
    };
    debug!(
        target: "healthdash::storage",
        "read_raw: locator='{}' rows={} cols={}",
        locator, df.height(), df.width()
    );
    Ok(df)
}

fn read_csv(path: &Path, skip_rows: usize) -> DashResult<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_skip_rows(skip_rows)
        // Zero inference rows: every column comes back as a string.
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| {
            opts.with_truncate_ragged_lines(true)
                .with_encoding(CsvEncoding::LossyUtf8)
        })
        .try_into_reader_with_file_path(Some(path.into()))?
        .finish()?;
    normalise_names(df)
}

fn read_excel(path: &Path, locator: &str, sheet: Option<&str>, skip_rows: usize) -> DashResult<DataFrame> {
    let excel_err = |detail: String| DashError::Excel { locator: locator.to_string(), detail };
    let mut workbook = open_workbook_auto(path).map_err(|e| excel_err(e.to_string()))?;
    let range = match sheet {
        Some(name) => {
            if !workbook.sheet_names().iter().any(|s| s == name) {
                return Err(DashError::SourceNotFound { locator: format!("{} [sheet {}]", locator, name) });
            }
            workbook.worksheet_range(name).map_err(|e| excel_err(e.to_string()))?
        }
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| DashError::SourceNotFound { locator: format!("{} [first sheet]", locator) })?
            .map_err(|e| excel_err(e.to_string()))?,
    };
    let rows: Vec<&[Data]> = range.rows().skip(skip_rows).collect();
    let Some((header_row, body)) = rows.split_first() else {
        return Err(DashError::parse(locator, "worksheet has no header row"));
    };
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            let h = cell_text(c).unwrap_or_default();
            if h.is_empty() { format!("column_{}", idx + 1) } else { h }
        })
        .collect();
    let mut columns: Vec<Column> = Vec::with_capacity(headers.len());
    for (idx, name) in dedupe(headers).into_iter().enumerate() {
        let values: Vec<Option<String>> = body.iter().map(|row| row.get(idx).and_then(cell_text)).collect();
        columns.push(Series::new(name.into(), values).into());
    }
    Ok(DataFrame::new(columns)?)
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string()),
    }
}

fn normalise_names(mut df: DataFrame) -> DashResult<DataFrame> {
    let names: Vec<String> = df.get_column_names().iter().map(|s| s.trim().to_string()).collect();
    df.set_column_names(dedupe(names))?;
    Ok(df)
}

/// Copy of `df` with its first `names.len()` columns renamed, for sources whose real header
/// is not the first row (stacked workbook tables).
pub(crate) fn rename_leading(df: &DataFrame, names: &[String], locator: &str) -> DashResult<DataFrame> {
    if names.len() > df.width() {
        return Err(DashError::parse(
            locator,
            format!("header override names {} columns but the source has {}", names.len(), df.width()),
        ));
    }
    let mut out = df.clone();
    let mut all: Vec<String> = names.iter().map(|s| s.trim().to_string()).collect();
    all.extend(df.get_column_names().iter().skip(names.len()).map(|s| s.to_string()));
    out.set_column_names(dedupe(all))?;
    Ok(out)
}

/// Suffix repeated header names so every column stays addressable.
fn dedupe(names: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    names
        .into_iter()
        .map(|n| {
            let mut candidate = n.clone();
            let mut k = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{}_{}", n, k);
                k += 1;
            }
            candidate
        })
        .collect()
}
