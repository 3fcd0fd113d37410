//!
//! healthdash page catalog
//! -----------------------
//! A page is data, not code: which sources to load, how to join them, which statistic to
//! compute and how to chart the result. The built-in catalog reproduces the dashboard's
//! pages; a JSON file with the same shape can replace it (`HEALTHDASH_PAGES`).

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DashError, DashResult};
use crate::pipeline::{CategoryMatch, FilterSpec, PageParams, CATEGORY, ENTITY_ID, ENTITY_NAME, YEAR};
use crate::present::{ChartKind, ChartSpec};
use crate::stats::MAX_DEGREE;
use crate::storage::{Combine, MetadataSpec, RowBlock, SourceFormat, SourceSpec, YearRange};

fn default_min_rows() -> usize { 3 }
fn default_degree() -> usize { 3 }
fn default_grid_points() -> usize { 100 }

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Analysis {
    #[default]
    None,
    Correlation { x: String, y: String },
    Regression { x: String, y: String },
    CorrelationByGroup {
        x: String,
        y: String,
        group: String,
        #[serde(default = "default_min_rows")]
        min_rows: usize,
    },
    RegressionByEntity {
        x: String,
        y: String,
        #[serde(default = "default_min_rows")]
        min_rows: usize,
    },
    CurveFit {
        x: String,
        y: String,
        #[serde(default = "default_degree")]
        degree: usize,
        #[serde(default = "default_grid_points")]
        grid_points: usize,
    },
    /// Mean of `value` per year across the selected entities.
    Trend { value: String },
}

impl Analysis {
    /// Columns the statistic reads.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Analysis::None => Vec::new(),
            Analysis::Correlation { x, y }
            | Analysis::Regression { x, y }
            | Analysis::RegressionByEntity { x, y, .. }
            | Analysis::CurveFit { x, y, .. } => vec![x.as_str(), y.as_str()],
            Analysis::CorrelationByGroup { x, y, group, .. } => vec![x.as_str(), y.as_str(), group.as_str()],
            Analysis::Trend { value } => vec![value.as_str()],
        }
    }

    /// Swap the dependent column for a user choice.
    fn with_dependent(&self, column: &str) -> Analysis {
        let mut out = self.clone();
        match &mut out {
            Analysis::None => {}
            Analysis::Correlation { y, .. }
            | Analysis::Regression { y, .. }
            | Analysis::CorrelationByGroup { y, .. }
            | Analysis::RegressionByEntity { y, .. }
            | Analysis::CurveFit { y, .. } => *y = column.to_string(),
            Analysis::Trend { value } => *value = column.to_string(),
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataJoin {
    pub source: MetadataSpec,
    /// Drop rows without metadata.
    #[serde(default)]
    pub require: bool,
}

/// Restrict a page to the `n` entities with the highest mean of `column`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopN {
    pub column: String,
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub caption: String,
    pub indicators: Vec<SourceSpec>,
    #[serde(default)]
    pub metadata: Option<MetadataJoin>,
    #[serde(default)]
    pub analysis: Analysis,
    pub chart: ChartSpec,
    /// Indicators the user may swap in as the dependent variable.
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub top_n: Option<TopN>,
    #[serde(default)]
    pub default_filter: FilterSpec,
}

impl PageSpec {
    /// Every indicator name the page's sources produce, in declaration order.
    pub fn indicator_names(&self) -> Vec<String> {
        self.indicators.iter().flat_map(|s| s.indicators()).collect()
    }

    /// Columns a joined table for this page can carry.
    fn known_columns(&self) -> BTreeSet<String> {
        let mut cols: BTreeSet<String> = self.indicator_names().into_iter().collect();
        for c in [ENTITY_ID, ENTITY_NAME, YEAR] {
            cols.insert(c.to_string());
        }
        if self.indicators.iter().any(SourceSpec::has_category) {
            cols.insert(CATEGORY.to_string());
        }
        if let Some(m) = &self.metadata {
            if m.source.region_column.is_some() { cols.insert("region".into()); }
            if m.source.income_group_column.is_some() { cols.insert("income_group".into()); }
        }
        cols
    }

    /// Check that every column the page refers to is produced by its sources.
    pub fn validate(&self) -> DashResult<()> {
        let invalid = |msg: String| Err(DashError::InvalidPage(format!("page '{}': {}", self.id, msg)));
        if self.id.trim().is_empty() {
            return Err(DashError::InvalidPage("page id is empty".into()));
        }
        if self.indicators.is_empty() {
            return invalid("no indicator sources".into());
        }
        let names = self.indicator_names();
        let mut seen = HashSet::new();
        if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
            return invalid(format!("indicator '{}' is produced twice", dup));
        }
        let known = self.known_columns();
        let mut referenced: Vec<&str> = self.chart.bindings();
        referenced.extend(self.analysis.columns());
        if let Some(t) = &self.top_n {
            referenced.push(&t.column);
        }
        if let Some(c) = &self.default_filter.category {
            referenced.push(&c.column);
        }
        if let Some(unknown) = referenced.iter().find(|c| !known.contains(**c)) {
            return invalid(format!("column '{}' is not produced by any source", unknown));
        }
        if let Some(bad) = self.choices.iter().find(|c| !names.contains(*c)) {
            return invalid(format!("choice '{}' is not an indicator", bad));
        }
        if let Analysis::CurveFit { degree, grid_points, .. } = &self.analysis {
            if *degree > MAX_DEGREE {
                return invalid(format!("curve degree {} exceeds {}", degree, MAX_DEGREE));
            }
            if *grid_points < 2 {
                return invalid(format!("curve grid needs at least 2 points, got {}", grid_points));
            }
        }
        if let Some(err) = self.indicators.iter().find_map(|s| s.check_shape().err().map(|e| (s, e))) {
            return invalid(format!("source '{}': {}", err.0.locator, err.1));
        }
        Ok(())
    }

    /// Apply the user's chart and indicator choices.
    pub fn resolve(&self, params: &PageParams) -> DashResult<PageSpec> {
        let mut page = self.clone();
        if let Some(choice) = &params.indicator {
            if !self.choices.iter().any(|c| c == choice) {
                return Err(DashError::InvalidPage(format!(
                    "'{}' is not a choice on page '{}' (choices: {})",
                    choice,
                    self.id,
                    self.choices.join(", ")
                )));
            }
            page.chart.y = choice.clone();
            page.analysis = self.analysis.with_dependent(choice);
        }
        if let Some(kind) = params.chart_kind {
            page.chart.kind = kind;
        }
        if let Some(log_x) = params.log_x {
            page.chart.log_x = log_x;
        }
        Ok(page)
    }

    /// Indicators the chart, statistic or top-N selection actually read.
    pub fn needed_indicators(&self) -> BTreeSet<String> {
        let names: BTreeSet<String> = self.indicator_names().into_iter().collect();
        let mut used: Vec<&str> = self.chart.bindings();
        used.extend(self.analysis.columns());
        if let Some(t) = &self.top_n {
            used.push(&t.column);
        }
        used.into_iter().filter(|c| names.contains(*c)).map(str::to_string).collect()
    }

    pub fn summary(&self) -> PageSummary {
        PageSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            caption: self.caption.clone(),
            choices: self.choices.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    pub id: String,
    pub title: String,
    pub caption: String,
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pages: Vec<PageSpec>,
}

impl Catalog {
    pub fn new(pages: Vec<PageSpec>) -> DashResult<Self> {
        let mut ids = HashSet::new();
        for p in &pages {
            p.validate()?;
            if !ids.insert(p.id.clone()) {
                return Err(DashError::InvalidPage(format!("page id '{}' is used twice", p.id)));
            }
        }
        Ok(Self { pages })
    }

    pub fn from_json(text: &str) -> DashResult<Self> {
        #[derive(Deserialize)]
        struct Raw {
            pages: Vec<PageSpec>,
        }
        let raw: Raw = serde_json::from_str(text).map_err(|e| DashError::InvalidPage(format!("catalog: {}", e)))?;
        Self::new(raw.pages)
    }

    pub fn load(path: &Path) -> DashResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DashError::Io { locator: path.display().to_string(), source: e })?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> DashResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DashError::InvalidPage(format!("catalog: {}", e)))
    }

    pub fn pages(&self) -> &[PageSpec] { &self.pages }

    pub fn get(&self, id: &str) -> DashResult<&PageSpec> {
        self.pages.iter().find(|p| p.id == id).ok_or_else(|| DashError::UnknownPage(id.to_string()))
    }

    /// The dashboard's own pages over its usual extract file names.
    pub fn builtin() -> DashResult<Self> { Self::new(builtin_pages()) }
}

pub const DISEASE_SPEND_CSV: &str = "current_health_expenditure_per_capita.csv";
pub const TB_CSV: &str = "incidence_of_tuberculosis_per_100000.csv";
pub const MEASLES_XLSX: &str = "Measles reported cases and incidence 2025-12-02 18-23 UTC.xlsx";

const HEALTH_EXP: &str = "Health Expenditure";
const LIFE_EXP: &str = "Life Expectancy";

fn world_bank(locator: &str, indicator: &str) -> SourceSpec {
    SourceSpec::wide(locator, SourceFormat::Csv { skip_rows: 4 }, "Country Code", indicator)
        .with_name_column("Country Name")
}

fn expenditure_vs_life() -> Vec<SourceSpec> {
    vec![
        world_bank("API_SH.XPD.CHEX.PC.CD_DS2_en_csv_v2_75935.csv", HEALTH_EXP),
        world_bank("API_SP.DYN.LE00.IN_DS2_en_CSV_v2_76065.csv", LIFE_EXP),
    ]
}

/// Year-indexed aggregate series with no per-country rows.
fn global_series(locator: &str, values: &[&str]) -> SourceSpec {
    SourceSpec::long(locator, SourceFormat::default(), "", "Year", values).with_entity("World")
}

fn labelled(mut chart: ChartSpec, labels: &[(&str, &str)]) -> ChartSpec {
    for (col, label) in labels {
        chart.labels.insert(col.to_string(), label.to_string());
    }
    chart
}

fn builtin_pages() -> Vec<PageSpec> {
    let spend_labels = [(HEALTH_EXP, "Health Expenditure per Capita (USD)"), (LIFE_EXP, "Life Expectancy (Years)")];
    let workers = [
        "Medical doctors (per 10 000 population)",
        "Nursing and midwifery personnel (per 10 000 population)",
        "Dentists (per 10 000 population)",
        "Pharmacists (per 10 000 population)",
    ];
    let workforce_exp = "Health Expenditure (% GDP)";
    let workforce_source = || {
        let mut values = vec![workforce_exp];
        values.extend(workers);
        SourceSpec::long("workforce_expenditure.csv", SourceFormat::default(), "Country", "Year", &values)
    };
    let disease_spend = "Healthcare Spending Per 100,000 People ($)";
    let tb = "TB Incidence Rate";
    let measles = "Measles Incidence Rate";
    let disease_years = YearRange::new(2000, 2023);
    let merged_spend = "Healthcare Spending per 100,000";
    let incidence = "Incidence";
    let literacy = "Literacy Rate";
    let coverage = "Immunisation Coverage (%)";

    vec![
        PageSpec {
            id: "life-expectancy-map".into(),
            title: "Global Life Expectancy".into(),
            caption: "Life expectancy by country for the selected year.".into(),
            indicators: vec![world_bank("API_SP.DYN.LE00.IN_DS2_en_CSV_v2_76065.csv", LIFE_EXP)],
            metadata: None,
            analysis: Analysis::None,
            chart: ChartSpec::new(ChartKind::Choropleth, "Regional Disparities in Life Expectancy", ENTITY_ID, LIFE_EXP),
            choices: Vec::new(),
            top_n: None,
            default_filter: FilterSpec { years: Some(YearRange::new(2010, 2010)), ..Default::default() },
        },
        PageSpec {
            id: "life-expectancy-expenditure".into(),
            title: "Life Expectancy vs Healthcare Expenditure".into(),
            caption: "Linear fit of life expectancy on per-capita health expenditure.".into(),
            indicators: expenditure_vs_life(),
            metadata: None,
            analysis: Analysis::Regression { x: HEALTH_EXP.into(), y: LIFE_EXP.into() },
            chart: labelled(
                ChartSpec::new(ChartKind::Scatter, "Health Expenditure vs Life Expectancy", HEALTH_EXP, LIFE_EXP)
                    .with_color(YEAR)
                    .with_log_x()
                    .with_trendline(),
                &spend_labels,
            ),
            choices: Vec::new(),
            top_n: None,
            default_filter: FilterSpec::default(),
        },
        PageSpec {
            id: "income-group-analysis".into(),
            title: "Healthcare Expenditure and Life Expectancy by Income Group".into(),
            caption: "Correlation within each World Bank income group.".into(),
            indicators: expenditure_vs_life(),
            metadata: Some(MetadataJoin {
                source: MetadataSpec {
                    locator: "Metadata_Country_API_SH.XPD.CHEX.PC.CD_DS2_en_csv_v2_75935.csv".into(),
                    format: SourceFormat::default(),
                    id_column: "Country Code".into(),
                    region_column: Some("Region".into()),
                    income_group_column: Some("IncomeGroup".into()),
                },
                require: true,
            }),
            analysis: Analysis::CorrelationByGroup {
                x: HEALTH_EXP.into(),
                y: LIFE_EXP.into(),
                group: "income_group".into(),
                min_rows: default_min_rows(),
            },
            chart: labelled(
                ChartSpec::new(ChartKind::Scatter, "Life Expectancy vs Health Expenditure by Income Group", HEALTH_EXP, LIFE_EXP)
                    .with_color("income_group")
                    .with_log_x()
                    .with_trendline(),
                &spend_labels,
            ),
            choices: Vec::new(),
            top_n: None,
            default_filter: FilterSpec::default(),
        },
        PageSpec {
            id: "country-comparison".into(),
            title: "Country Comparison".into(),
            caption: "Separate regressions for each selected country.".into(),
            indicators: expenditure_vs_life(),
            metadata: None,
            analysis: Analysis::RegressionByEntity { x: HEALTH_EXP.into(), y: LIFE_EXP.into(), min_rows: default_min_rows() },
            chart: labelled(
                ChartSpec::new(ChartKind::Scatter, "Health Expenditure vs Life Expectancy by Country", HEALTH_EXP, LIFE_EXP)
                    .with_color(ENTITY_NAME)
                    .with_log_x()
                    .with_trendline(),
                &spend_labels,
            ),
            choices: Vec::new(),
            top_n: None,
            default_filter: FilterSpec {
                entities: Some(
                    ["Australia", "India", "China", "Japan", "Indonesia", "Algeria"].iter().map(|s| s.to_string()).collect(),
                ),
                ..Default::default()
            },
        },
        PageSpec {
            id: "optimal-spending".into(),
            title: "Optimal Healthcare Spending".into(),
            caption: "Cubic fit of life expectancy at birth on expenditure; the optimum is read off a grid.".into(),
            indicators: vec![SourceSpec::long(
                "merged_lifeBirth_spend.csv",
                SourceFormat::default(),
                "Location",
                "Year",
                &["Healthcare Expenditure", "Life Expectancy at Birth"],
            )
            .with_category_column("Gender")],
            metadata: None,
            analysis: Analysis::CurveFit {
                x: "Healthcare Expenditure".into(),
                y: "Life Expectancy at Birth".into(),
                degree: default_degree(),
                grid_points: default_grid_points(),
            },
            chart: ChartSpec::new(ChartKind::Scatter, "Healthcare Expenditure vs Life Expectancy", "Healthcare Expenditure", "Life Expectancy at Birth")
                .with_color(ENTITY_NAME),
            choices: Vec::new(),
            top_n: None,
            default_filter: FilterSpec {
                category: Some(CategoryMatch { column: CATEGORY.into(), value: "Both sexes".into() }),
                ..Default::default()
            },
        },
        PageSpec {
            id: "workforce-expenditure".into(),
            title: "Health Workforce vs Health Expenditure".into(),
            caption: "Correlation between expenditure share of GDP and workforce density.".into(),
            indicators: vec![workforce_source()],
            metadata: None,
            analysis: Analysis::Correlation { x: workforce_exp.into(), y: workers[0].into() },
            chart: ChartSpec::new(ChartKind::Scatter, "Health Expenditure vs Workforce Density", workforce_exp, workers[0])
                .with_color(ENTITY_NAME)
                .with_trendline(),
            choices: workers.iter().map(|s| s.to_string()).collect(),
            top_n: None,
            default_filter: FilterSpec { entities: Some(vec!["Singapore".into(), "Malaysia".into()]), ..Default::default() },
        },
        PageSpec {
            id: "workforce-trend".into(),
            title: "Health Workforce Over Time".into(),
            caption: "Workforce density by year; switch between line and bar views.".into(),
            indicators: vec![workforce_source()],
            metadata: None,
            analysis: Analysis::Trend { value: workers[0].into() },
            chart: ChartSpec::new(ChartKind::Line, "Workforce Density by Year", YEAR, workers[0]).with_color(ENTITY_NAME),
            choices: workers.iter().map(|s| s.to_string()).collect(),
            top_n: None,
            default_filter: FilterSpec { entities: Some(vec!["Singapore".into(), "Malaysia".into()]), ..Default::default() },
        },
        PageSpec {
            id: "disease-incidence".into(),
            title: "Healthcare Spending vs Disease Incidence".into(),
            caption: "Spending per 100,000 people against the selected disease's incidence rate.".into(),
            indicators: vec![
                SourceSpec::wide(DISEASE_SPEND_CSV, SourceFormat::Csv { skip_rows: 4 }, "Country Name", disease_spend)
                    .with_years(disease_years)
                    .with_scale(1000.0),
                SourceSpec::wide(TB_CSV, SourceFormat::Csv { skip_rows: 4 }, "Country Name", tb).with_years(disease_years),
                SourceSpec::wide(
                    MEASLES_XLSX,
                    SourceFormat::Excel { sheet: Some("Sheet1".into()), skip_rows: 0 },
                    "Country / Region",
                    measles,
                )
                .with_category_column("Disease")
                .with_years(disease_years)
                .with_scale(0.1),
            ],
            metadata: None,
            analysis: Analysis::Correlation { x: disease_spend.into(), y: tb.into() },
            chart: ChartSpec::new(ChartKind::Scatter, "Healthcare Spending vs Incidence Rate", disease_spend, tb)
                .with_color(ENTITY_NAME)
                .with_trendline(),
            choices: vec![tb.into(), measles.into()],
            top_n: None,
            default_filter: FilterSpec::default(),
        },
        PageSpec {
            id: "disease-spending-3d".into(),
            title: "Healthcare Spending vs Communicable Disease Incidence (3D)".into(),
            caption: "Global spending and incidence by year, one line per disease.".into(),
            indicators: vec![
                global_series("final_merged_dataset.csv", &[merged_spend]),
                global_series("final_merged_dataset.csv", &["TB Incidence", "Measles Incidence"]).stacked_as(incidence),
            ],
            metadata: None,
            analysis: Analysis::None,
            chart: ChartSpec::new(
                ChartKind::Line3d,
                "Healthcare Spending vs Communicable Disease Incidence",
                YEAR,
                merged_spend,
            )
            .with_z(incidence)
            .with_color(CATEGORY),
            choices: Vec::new(),
            top_n: None,
            default_filter: FilterSpec::default(),
        },
        PageSpec {
            id: "immunisation-disease".into(),
            title: "Immunisation Expenditure vs Disease Cases".into(),
            caption: "Government vaccine spending summed per country and year, top spenders only.".into(),
            indicators: vec![
                SourceSpec::long("Immunization_expenditure.csv", SourceFormat::default(), "COUNTRYNAME", "YEAR", &["VALUE"])
                    .with_category_column("INDCODE")
                    .with_combine(Combine::Sum),
                SourceSpec::long("Infectious_Disease.csv", SourceFormat::default(), "Location", "Period", &["FactValueNumeric"])
                    .with_combine(Combine::Sum),
            ],
            metadata: None,
            analysis: Analysis::RegressionByEntity { x: "VALUE".into(), y: "FactValueNumeric".into(), min_rows: default_min_rows() },
            chart: labelled(
                ChartSpec::new(ChartKind::Scatter, "Immunisation Expenditure vs Disease Cases", "VALUE", "FactValueNumeric")
                    .with_color(ENTITY_NAME)
                    .with_trendline(),
                &[("VALUE", "Immunisation Expenditure"), ("FactValueNumeric", "Disease Cases")],
            ),
            choices: Vec::new(),
            top_n: Some(TopN { column: "VALUE".into(), n: 10 }),
            default_filter: FilterSpec {
                category: Some(CategoryMatch { column: CATEGORY.into(), value: "FIN_GVT_VACC".into() }),
                ..Default::default()
            },
        },
        PageSpec {
            id: "primary-enrolment".into(),
            title: "Primary School Enrolment in ASEAN".into(),
            caption: "Enrolment rate by country and year.".into(),
            indicators: vec![SourceSpec::wide(
                "ASEAN pri sch enrolment rate.xlsx",
                SourceFormat::Excel { sheet: None, skip_rows: 0 },
                "Country",
                "Enrolment Rate",
            )
            .with_years(YearRange::new(2013, 2022))],
            metadata: None,
            analysis: Analysis::Trend { value: "Enrolment Rate".into() },
            chart: ChartSpec::new(ChartKind::Line, "Primary School Enrolment Rate", YEAR, "Enrolment Rate").with_color(ENTITY_NAME),
            choices: Vec::new(),
            top_n: None,
            default_filter: FilterSpec::default(),
        },
        PageSpec {
            id: "literacy-rate".into(),
            title: "Adult Literacy Rates in ASEAN".into(),
            caption: "Literacy rate by country and year; the workbook stacks total, male and female tables.".into(),
            indicators: vec![SourceSpec::wide(
                "ASEAN adult literacy rate.xlsx",
                SourceFormat::Excel { sheet: None, skip_rows: 0 },
                "Country",
                literacy,
            )
            .with_years(YearRange::new(2013, 2022))
            .with_row_blocks(vec![RowBlock::new("Total", 0, 6), RowBlock::new("Male", 8, 14), RowBlock::new("Female", 16, 22)])],
            metadata: None,
            analysis: Analysis::Trend { value: literacy.into() },
            chart: ChartSpec::new(ChartKind::Line, "Literacy Rates in ASEAN Countries", YEAR, literacy).with_color(ENTITY_NAME),
            choices: Vec::new(),
            top_n: None,
            default_filter: FilterSpec {
                category: Some(CategoryMatch { column: CATEGORY.into(), value: "Total".into() }),
                ..Default::default()
            },
        },
        PageSpec {
            id: "immunisation-coverage".into(),
            title: "Measles and DPT Immunisation in ASEAN".into(),
            caption: "Share of children immunised by country and year; pick the vaccine with the category filter.".into(),
            indicators: vec![SourceSpec::wide(
                "ASEAN immunisation against measles and DPT.xlsx",
                SourceFormat::Excel { sheet: None, skip_rows: 0 },
                "Country",
                coverage,
            )
            .with_header(&["Country", "2013", "2014", "2015", "2016", "2017", "2018", "2019"])
            .with_years(YearRange::new(2013, 2019))
            .with_row_blocks(vec![RowBlock::new("Measles", 0, 8), RowBlock::new("DPT", 8, 17)])],
            metadata: None,
            analysis: Analysis::Trend { value: coverage.into() },
            chart: ChartSpec::new(ChartKind::Line, "Immunisation Rates Over Time by Country", YEAR, coverage).with_color(ENTITY_NAME),
            choices: Vec::new(),
            top_n: None,
            default_filter: FilterSpec {
                category: Some(CategoryMatch { column: CATEGORY.into(), value: "Measles".into() }),
                ..Default::default()
            },
        },
        PageSpec {
            id: "life-expectancy-trend".into(),
            title: "Life Expectancy Over Time".into(),
            caption: "Life expectancy by country and year.".into(),
            indicators: vec![world_bank("API_SP.DYN.LE00.IN_DS2_en_CSV_v2_76065.csv", LIFE_EXP)],
            metadata: None,
            analysis: Analysis::Trend { value: LIFE_EXP.into() },
            chart: ChartSpec::new(ChartKind::Line, "Life Expectancy Trends", YEAR, LIFE_EXP).with_color(ENTITY_NAME),
            choices: Vec::new(),
            top_n: None,
            default_filter: FilterSpec {
                entities: Some(
                    ["Brunei Darussalam", "Cambodia", "Indonesia", "Lao PDR", "Malaysia", "Myanmar", "Philippines", "Singapore", "Thailand", "Viet Nam"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                ),
                ..Default::default()
            },
        },
    ]
}
