//! Load -> Reshape -> Join -> Filter -> Statistics -> Present, once per page request.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::aggregate::{self, TrendPoint};
use super::filter::{self, CategoryMatch, FilterSpec};
use super::{enrich, inner_join, reshape, JoinedTable, ReshapeReport, ENTITY_NAME};
use crate::catalog::{Analysis, PageSpec};
use crate::error::DashResult;
use crate::present::{self, Chart, ChartKind, Overlay};
use crate::stats::{self, Correlation, GridOptimum, GroupResult, Regression, StatsError};
use crate::storage::{SourceStore, YearRange};

/// User controls for one page run. Unset fields fall back to the page defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub years: Option<YearRange>,
    #[serde(default)]
    pub entities: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<CategoryMatch>,
    #[serde(default)]
    pub chart_kind: Option<ChartKind>,
    /// One of the page's `choices`.
    #[serde(default)]
    pub indicator: Option<String>,
    #[serde(default)]
    pub log_x: Option<bool>,
}

impl PageParams {
    pub fn filter(&self) -> FilterSpec {
        FilterSpec { years: self.years, entities: self.entities.clone(), category: self.category.clone() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub code: String,
    pub message: String,
}

impl Notice {
    fn info(code: &str, message: String) -> Self { Self { level: NoticeLevel::Info, code: code.into(), message } }

    fn warning(code: &str, message: String) -> Self { Self { level: NoticeLevel::Warning, code: code.into(), message } }

    fn from_stats(err: &StatsError) -> Self { Self::warning(err.code(), err.to_string()) }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Summary {
    Correlation(Correlation),
    Regression(Regression),
    Groups { results: Vec<GroupResult<Correlation>> },
    Entities { results: Vec<GroupResult<Regression>> },
    CurveFit { degree: usize, optimum: GridOptimum },
    Trend { points: Vec<TrendPoint> },
}

#[derive(Debug, Clone, Serialize)]
pub struct PageOutcome {
    pub page: String,
    pub title: String,
    pub caption: String,
    pub rows: usize,
    pub chart: Option<Chart>,
    pub table: Vec<Value>,
    pub summary: Option<Summary>,
    pub notices: Vec<Notice>,
    pub reshape: ReshapeReport,
}

impl PageOutcome {
    pub fn has_notice(&self, code: &str) -> bool { self.notices.iter().any(|n| n.code == code) }
}

/// A page's table after Load, Reshape, Join and Filter.
#[derive(Debug, Clone)]
pub struct Selection {
    pub page: PageSpec,
    pub table: JoinedTable,
    pub report: ReshapeReport,
}

/// Runs pages against one source store.
pub struct Pipeline<'a> {
    store: &'a SourceStore,
}

impl<'a> Pipeline<'a> {
    pub fn new(store: &'a SourceStore) -> Self { Self { store } }

    /// Load, reshape, join and filter the page's data.
    pub fn select(&self, page: &PageSpec, params: &PageParams) -> DashResult<Selection> {
        let page = page.resolve(params)?;
        let needed = page.needed_indicators();

        let mut tables = Vec::new();
        let mut report = ReshapeReport::default();
        for source in &page.indicators {
            if !source.indicators().iter().any(|i| needed.contains(i)) {
                continue;
            }
            let loaded = self.store.load(source)?;
            let reshaped = reshape(&loaded)?;
            report.merge(&reshaped.report);
            tables.extend(reshaped.tables.into_iter().filter(|t| needed.contains(t.indicator())));
        }
        let mut joined = inner_join(&tables)?;
        if let Some(meta) = &page.metadata {
            let metadata = self.store.load_metadata(&meta.source)?;
            joined = enrich(&joined, &metadata, meta.require)?;
        }
        let spec = page.default_filter.overridden_by(&params.filter());
        let mut table = filter::apply(&joined, &spec)?;
        if let Some(top) = &page.top_n {
            let keep = aggregate::top_entities_by_mean(&table, &top.column, top.n)?;
            debug!(target: "healthdash::pipeline", "page '{}' top {} by '{}': {:?}", page.id, top.n, top.column, keep);
            table = filter::apply(&table, &FilterSpec { entities: Some(keep), ..Default::default() })?;
        }
        debug!(
            target: "healthdash::pipeline",
            "page '{}' selection: joined={} filtered={}",
            page.id, joined.height(), table.height()
        );
        Ok(Selection { page, table, report })
    }

    /// Run a page end to end. Data conditions that make a statistic impossible come back as
    /// notices with the chart omitted; load and schema failures are errors.
    pub fn run(&self, page: &PageSpec, params: &PageParams) -> DashResult<PageOutcome> {
        let Selection { page, table, report } = self.select(page, params)?;
        let mut outcome = PageOutcome {
            page: page.id.clone(),
            title: page.title.clone(),
            caption: page.caption.clone(),
            rows: table.height(),
            chart: None,
            table: present::table_view(table.frame()),
            summary: None,
            notices: Vec::new(),
            reshape: report.clone(),
        };
        if report.warnings() > 0 {
            outcome.notices.push(Notice::info(
                "reshape_warnings",
                format!(
                    "{} placeholder and {} unparseable cells were treated as missing",
                    report.placeholders, report.unparseable
                ),
            ));
        }
        if table.is_empty() {
            outcome.notices.push(Notice::info("empty_selection", "No data available for the selected filters.".into()));
            info!(target: "healthdash::pipeline", "page '{}': empty selection", page.id);
            return Ok(outcome);
        }

        let mut overlays = Vec::new();
        match analyse(&page.analysis, &table, &mut overlays) {
            Ok(summary) => outcome.summary = summary,
            Err(AnalysisError::Table(e)) => return Err(e),
            Err(AnalysisError::Stats(e)) => {
                outcome.notices.push(Notice::from_stats(&e));
                info!(target: "healthdash::pipeline", "page '{}': {}", page.id, e);
                return Ok(outcome);
            }
        }
        if let Some(Summary::CurveFit { optimum, .. }) = &outcome.summary {
            outcome.notices.push(Notice::info(
                "approximation",
                format!(
                    "Optimum located on a {}-point grid; the true maximum may lie between grid points.",
                    optimum.grid_points
                ),
            ));
        }
        for group in group_notes(&outcome.summary) {
            outcome.notices.push(Notice::info("insufficient_data", group));
        }

        let mut chart = present::render(table.frame(), &page.chart)?;
        for o in overlays {
            chart.push_overlay(o);
        }
        outcome.chart = Some(chart);
        info!(
            target: "healthdash::pipeline",
            "page '{}' rendered: rows={} notices={}",
            page.id, outcome.rows, outcome.notices.len()
        );
        Ok(outcome)
    }
}

fn analyse(analysis: &Analysis, table: &JoinedTable, overlays: &mut Vec<Overlay>) -> Result<Option<Summary>, AnalysisError> {
    Ok(match analysis {
        Analysis::None => None,
        Analysis::Correlation { x, y } => {
            let (xs, ys) = table.pairs(x, y)?;
            Some(Summary::Correlation(stats::pearson(&xs, &ys)?))
        }
        Analysis::Regression { x, y } => {
            let (xs, ys) = table.pairs(x, y)?;
            Some(Summary::Regression(stats::ols(&xs, &ys)?))
        }
        Analysis::CorrelationByGroup { x, y, group, min_rows } => {
            let rows = table.grouped_pairs(group, x, y)?;
            Some(Summary::Groups { results: stats::by_group(rows, *min_rows, stats::pearson) })
        }
        Analysis::RegressionByEntity { x, y, min_rows } => {
            let rows = table.grouped_pairs(ENTITY_NAME, x, y)?;
            Some(Summary::Entities { results: stats::by_group(rows, *min_rows, stats::ols) })
        }
        Analysis::CurveFit { x, y, degree, grid_points } => {
            let (xs, ys) = table.pairs(x, y)?;
            let fit = stats::fit_curve(&xs, &ys, *degree, *grid_points)?;
            overlays.push(Overlay::Curve { name: format!("degree {} fit", degree), points: fit.curve.clone() });
            overlays.push(Overlay::Marker { name: "optimum (grid)".into(), x: fit.optimum.x, y: fit.optimum.y });
            Some(Summary::CurveFit { degree: fit.polynomial.degree(), optimum: fit.optimum })
        }
        Analysis::Trend { value } => Some(Summary::Trend { points: aggregate::mean_by_year(table, value)? }),
    })
}

fn group_notes(summary: &Option<Summary>) -> Vec<String> {
    let notes = |group: &str, note: &Option<String>| note.as_ref().map(|n| format!("{}: {}", group, n));
    match summary {
        Some(Summary::Groups { results }) => results.iter().filter_map(|r| notes(&r.group, &r.note)).collect(),
        Some(Summary::Entities { results }) => results.iter().filter_map(|r| notes(&r.group, &r.note)).collect(),
        _ => Vec::new(),
    }
}

/// Statistic failures become notices; table errors propagate.
enum AnalysisError {
    Stats(StatsError),
    Table(crate::error::DashError),
}

impl From<StatsError> for AnalysisError {
    fn from(e: StatsError) -> Self { AnalysisError::Stats(e) }
}

impl From<crate::error::DashError> for AnalysisError {
    fn from(e: crate::error::DashError) -> Self { AnalysisError::Table(e) }
}
