//! Chart descriptions, table views and CSV export.
//!
//! Nothing here draws. A `Chart` is the data a front end needs to draw one figure: the
//! bound columns, the rows as JSON objects and any overlays computed from them. Inputs are
//! only ever borrowed.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DashError, DashResult};
use crate::pipeline::{has_column, JoinedTable};
use crate::stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Scatter,
    Line,
    Bar,
    Area,
    /// `x` binds the ISO3 location column, `y` the colour value.
    Choropleth,
    /// `x`, `y` and `z` axes.
    Line3d,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x: String,
    pub y: String,
    #[serde(default)]
    pub z: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub log_x: bool,
    #[serde(default)]
    pub log_y: bool,
    /// Per-colour OLS trendlines (scatter only).
    #[serde(default)]
    pub trendline: bool,
    /// Axis labels by column name.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: &str, x: &str, y: &str) -> Self {
        Self {
            kind,
            title: title.to_string(),
            x: x.to_string(),
            y: y.to_string(),
            z: None,
            color: None,
            log_x: false,
            log_y: false,
            trendline: false,
            labels: BTreeMap::new(),
        }
    }

    pub fn with_color(mut self, column: &str) -> Self { self.color = Some(column.to_string()); self }
    pub fn with_z(mut self, column: &str) -> Self { self.z = Some(column.to_string()); self }
    pub fn with_log_x(mut self) -> Self { self.log_x = true; self }
    pub fn with_trendline(mut self) -> Self { self.trendline = true; self }

    /// Every column the chart reads.
    pub fn bindings(&self) -> Vec<&str> {
        let mut cols = vec![self.x.as_str(), self.y.as_str()];
        if let Some(z) = &self.z { cols.push(z); }
        if let Some(c) = &self.color { cols.push(c); }
        cols
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    /// Fitted curve sampled on a grid.
    Curve { name: String, points: Vec<(f64, f64)> },
    Marker { name: String, x: f64, y: f64 },
    /// OLS segment across the group's x range.
    Trendline { group: Option<String>, slope: f64, intercept: f64, r_squared: f64, from: (f64, f64), to: (f64, f64) },
}

#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub spec: ChartSpec,
    pub rows: Vec<Value>,
    pub overlays: Vec<Overlay>,
}

impl Chart {
    pub fn push_overlay(&mut self, overlay: Overlay) { self.overlays.push(overlay); }
}

/// Validate the bindings against `df` and describe the figure.
pub fn render(df: &DataFrame, spec: &ChartSpec) -> DashResult<Chart> {
    if spec.kind == ChartKind::Line3d && spec.z.is_none() {
        return Err(DashError::InvalidPage("a 3D line chart needs a z column".into()));
    }
    if let Some(missing) = spec.bindings().into_iter().find(|c| !has_column(df, c)) {
        return Err(DashError::InvalidPage(format!("chart '{}' binds unknown column '{}'", spec.title, missing)));
    }
    let view = df.select(dedup(spec.bindings()))?;
    let mut chart = Chart { spec: spec.clone(), rows: rows_json(&view), overlays: Vec::new() };
    if spec.trendline && spec.kind == ChartKind::Scatter {
        for overlay in trendlines(df, spec)? {
            chart.push_overlay(overlay);
        }
    }
    Ok(chart)
}

fn dedup(cols: Vec<&str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(cols.len());
    for c in cols {
        if !out.iter().any(|o| o == c) {
            out.push(c.to_string());
        }
    }
    out
}

/// One OLS line per colour group (or one overall). Groups that cannot be fitted get none.
fn trendlines(df: &DataFrame, spec: &ChartSpec) -> DashResult<Vec<Overlay>> {
    let xs = crate::pipeline::f64_column(df, &spec.x)?;
    let ys = crate::pipeline::f64_column(df, &spec.y)?;
    let groups: Vec<Option<String>> = match &spec.color {
        Some(c) => crate::storage::string_column(df, c)?,
        None => vec![None; xs.len()],
    };
    let mut by_group: BTreeMap<Option<String>, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for ((g, x), y) in groups.into_iter().zip(xs).zip(ys) {
        let (Some(x), Some(y)) = (x, y) else { continue };
        // A log axis cannot place non-positive x
        if spec.log_x && x <= 0.0 { continue; }
        let slot = by_group.entry(g).or_default();
        slot.0.push(x);
        slot.1.push(y);
    }
    let mut out = Vec::new();
    for (group, (xs, ys)) in by_group {
        let Ok(fit) = stats::ols(&xs, &ys) else { continue };
        let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        out.push(Overlay::Trendline {
            group,
            slope: fit.slope,
            intercept: fit.intercept,
            r_squared: fit.r_squared,
            from: (lo, fit.predict(lo)),
            to: (hi, fit.predict(hi)),
        });
    }
    Ok(out)
}

/// Rows as JSON objects keyed by column name.
pub fn table_view(df: &DataFrame) -> Vec<Value> { rows_json(df) }

fn rows_json(df: &DataFrame) -> Vec<Value> {
    let cols = df.get_column_names();
    let mut out = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let mut map = serde_json::Map::with_capacity(cols.len());
        for c in &cols {
            let v = match df.column(c).and_then(|s| s.get(row_idx)) {
                Ok(AnyValue::Int64(v)) => serde_json::json!(v),
                Ok(AnyValue::Int32(v)) => serde_json::json!(v as i64),
                Ok(AnyValue::Float64(v)) => serde_json::json!(v),
                Ok(AnyValue::Boolean(v)) => serde_json::json!(v),
                Ok(AnyValue::String(v)) => serde_json::json!(v),
                Ok(AnyValue::StringOwned(v)) => serde_json::json!(v.as_str()),
                _ => Value::Null,
            };
            map.insert(c.to_string(), v);
        }
        out.push(Value::Object(map));
    }
    out
}

/// The joined table as UTF-8 CSV with a header row.
pub fn to_csv(table: &JoinedTable) -> DashResult<String> {
    let mut df = table.frame().clone();
    let mut buf: Vec<u8> = Vec::new();
    CsvWriter::new(&mut buf).include_header(true).finish(&mut df)?;
    String::from_utf8(buf).map_err(|e| DashError::parse("export", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{inner_join, LongRecord, LongTable};

    fn joined() -> JoinedTable {
        let mk = |id: &str, x: f64| LongRecord { entity_id: id.into(), entity_name: id.into(), category: None, year: 2000, value: x };
        let a = LongTable::from_records("Spend", false, &[mk("A", 1.0), mk("B", 2.0), mk("C", 3.0)]).unwrap();
        let b = LongTable::from_records("Life", false, &[mk("A", 5.0), mk("B", 7.0), mk("C", 9.0)]).unwrap();
        inner_join(&[a, b]).unwrap()
    }

    #[test]
    fn unknown_binding_is_rejected() {
        let spec = ChartSpec::new(ChartKind::Scatter, "t", "Spend", "Nope");
        let err = render(joined().frame(), &spec).unwrap_err();
        assert!(matches!(err, DashError::InvalidPage(m) if m.contains("Nope")));
        let spec = ChartSpec::new(ChartKind::Line3d, "t", "Spend", "Life");
        assert!(render(joined().frame(), &spec).is_err());
    }

    #[test]
    fn scatter_rows_and_trendline() {
        let spec = ChartSpec::new(ChartKind::Scatter, "t", "Spend", "Life").with_trendline();
        let chart = render(joined().frame(), &spec).unwrap();
        assert_eq!(chart.rows.len(), 3);
        assert_eq!(chart.rows[1], serde_json::json!({"Spend": 2.0, "Life": 7.0}));
        match &chart.overlays[..] {
            [Overlay::Trendline { group: None, slope, intercept, .. }] => {
                assert!((slope - 2.0).abs() < 1e-9);
                assert!((intercept - 3.0).abs() < 1e-9);
            }
            other => panic!("unexpected overlays {:?}", other),
        }
    }

    #[test]
    fn table_view_keeps_types() {
        let rows = table_view(joined().frame());
        assert_eq!(rows[0]["year"], serde_json::json!(2000));
        assert_eq!(rows[0]["entity_id"], serde_json::json!("A"));
    }

    #[test]
    fn csv_header_matches_fields() {
        let csv = to_csv(&joined()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("entity_id,entity_name,year,Spend,Life"));
        assert_eq!(lines.count(), 3);
    }

    #[test]
    fn render_does_not_touch_input() {
        let table = joined();
        let before = table.frame().clone();
        let spec = ChartSpec::new(ChartKind::Bar, "t", "entity_name", "Life");
        render(table.frame(), &spec).unwrap();
        assert!(table.frame().equals(&before));
    }
}
