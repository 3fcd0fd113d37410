use std::sync::Arc;

use polars::prelude::*;

use super::*;
use crate::storage::{RowBlock, SourceFormat, SourceSpec, YearRange};

fn strings(name: &str, cells: &[Option<&str>]) -> Column {
    Series::new(name.into(), cells.to_vec()).into()
}

fn wide_frame() -> DataFrame {
    DataFrame::new(vec![
        strings("Country Name", &[Some("Aland"), Some("Borduria"), Some("Carpania"), Some("")]),
        strings("Country Code", &[Some("ALD"), Some("BRD"), Some("CRP"), Some("")]),
        strings("2000", &[Some("10"), Some(".."), Some("1,250.5"), Some("7")]),
        strings("2001", &[Some("11"), None, Some("abc"), Some("8")]),
        strings("2002", &[Some("-"), Some("21"), Some("13"), Some("9")]),
    ])
    .unwrap()
}

fn wide_spec() -> SourceSpec {
    SourceSpec::wide("h.csv", SourceFormat::Csv { skip_rows: 4 }, "Country Code", "Health Expenditure")
        .with_name_column("Country Name")
        .with_years(YearRange::new(2000, 2002))
}

#[test]
fn wide_to_long_counts_missing_cells() {
    let table = IndicatorTable::new(wide_spec(), Arc::new(wide_frame())).unwrap();
    let out = reshape(&table).unwrap();
    assert_eq!(out.tables.len(), 1);
    let long = &out.tables[0];
    assert_eq!(long.indicator(), "Health Expenditure");
    assert!(!long.has_category());

    let recs = long.records().unwrap();
    let ald: Vec<(i32, f64)> = recs.iter().filter(|r| r.entity_id == "ALD").map(|r| (r.year, r.value)).collect();
    assert_eq!(ald, vec![(2000, 10.0), (2001, 11.0)]);
    let crp: Vec<(i32, f64)> = recs.iter().filter(|r| r.entity_id == "CRP").map(|r| (r.year, r.value)).collect();
    assert_eq!(crp, vec![(2000, 1250.5), (2002, 13.0)]);
    assert!(recs.iter().all(|r| r.entity_id != ""));
    assert_eq!(recs.iter().find(|r| r.entity_id == "BRD").unwrap().entity_name, "Borduria");

    assert_eq!(out.report.kept, 5);
    assert_eq!(out.report.placeholders, 2);
    assert_eq!(out.report.unparseable, 1);
    assert_eq!(out.report.blank, 1);
    assert_eq!(out.report.skipped_rows, 1);
    assert_eq!(out.report.warnings(), 3);
}

#[test]
fn pivot_recovers_every_present_cell() {
    let table = IndicatorTable::new(wide_spec(), Arc::new(wide_frame())).unwrap();
    let long = &reshape(&table).unwrap().tables[0];
    let pivot = long.pivot().unwrap();

    let ids = table.strings("Country Code").unwrap();
    for (col, year) in table.year_columns() {
        let cells = table.strings(col).unwrap();
        for (row, id) in ids.iter().enumerate() {
            let Some(id) = id.as_deref().filter(|s| !s.is_empty()) else { continue };
            let expected = cells[row].as_deref().and_then(parse_number);
            let got = pivot.get(&(id.to_string(), None)).and_then(|m| m.get(year)).copied();
            assert_eq!(got, expected, "{} {}", id, year);
        }
    }
}

#[test]
fn zero_fill_is_opt_in() {
    let spec = wide_spec().with_missing(MissingPolicy::ZeroFill);
    let table = IndicatorTable::new(spec, Arc::new(wide_frame())).unwrap();
    let out = reshape(&table).unwrap();
    let brd: Vec<(i32, f64)> = out.tables[0]
        .records()
        .unwrap()
        .into_iter()
        .filter(|r| r.entity_id == "BRD")
        .map(|r| (r.year, r.value))
        .collect();
    assert_eq!(brd, vec![(2000, 0.0), (2001, 0.0), (2002, 21.0)]);
    // text that is not a placeholder is never zero-filled
    assert_eq!(out.report.unparseable, 1);
}

#[test]
fn scale_multiplies_values() {
    let spec = wide_spec().with_scale(1000.0);
    let table = IndicatorTable::new(spec, Arc::new(wide_frame())).unwrap();
    let recs = reshape(&table).unwrap().tables[0].records().unwrap();
    assert_eq!(recs[0].value, 10_000.0);
}

fn immunisation_frame() -> DataFrame {
    DataFrame::new(vec![
        strings("COUNTRYNAME", &[Some("Aland"), Some("Aland"), Some("Aland"), Some("Borduria")]),
        strings("YEAR", &[Some("2015"), Some("2015"), Some("2016.0"), Some("2015")]),
        strings("VALUE", &[Some("100"), Some("50"), Some("70"), Some("n/a")]),
    ])
    .unwrap()
}

#[test]
fn long_layout_sums_duplicates_when_declared() {
    let spec = SourceSpec::long("imm.csv", SourceFormat::default(), "COUNTRYNAME", "YEAR", &["VALUE"])
        .with_combine(Combine::Sum);
    let table = IndicatorTable::new(spec, Arc::new(immunisation_frame())).unwrap();
    let out = reshape(&table).unwrap();
    let recs = out.tables[0].records().unwrap();
    let got: Vec<(String, i32, f64)> = recs.into_iter().map(|r| (r.entity_id, r.year, r.value)).collect();
    assert_eq!(got, vec![("Aland".to_string(), 2015, 150.0), ("Aland".to_string(), 2016, 70.0)]);
    assert_eq!(out.report.combined, 1);
    assert_eq!(out.report.placeholders, 1);
}

#[test]
fn long_layout_rejects_duplicates_by_default() {
    let spec = SourceSpec::long("imm.csv", SourceFormat::default(), "COUNTRYNAME", "YEAR", &["VALUE"]);
    let err = IndicatorTable::new(spec, Arc::new(immunisation_frame())).err().unwrap();
    assert!(matches!(err, DashError::DuplicateKey { .. }));
}

#[test]
fn long_layout_emits_one_table_per_value_column() {
    let frame = DataFrame::new(vec![
        strings("Location", &[Some("Aland"), Some("Aland"), Some("Borduria")]),
        strings("Gender", &[Some("Both sexes"), Some("Female"), Some("Both sexes")]),
        strings("Year", &[Some("2018"), Some("2018"), Some("2018")]),
        strings("Spend", &[Some("1200"), Some("1200"), Some("300")]),
        strings("Life", &[Some("81.2"), Some("83.0"), Some("")]),
    ])
    .unwrap();
    let spec = SourceSpec::long("merged.csv", SourceFormat::default(), "Location", "Year", &["Spend", "Life"])
        .with_category_column("Gender");
    let table = IndicatorTable::new(spec, Arc::new(frame)).unwrap();
    let out = reshape(&table).unwrap();
    assert_eq!(out.tables.iter().map(|t| t.indicator()).collect::<Vec<_>>(), vec!["Spend", "Life"]);
    assert!(out.tables[0].has_category());
    assert_eq!(out.tables[0].height(), 3);
    assert_eq!(out.tables[1].height(), 2);
    let life = out.tables[1].records().unwrap();
    assert_eq!(life[0].category.as_deref(), Some("Both sexes"));
    assert_eq!(life[1].category.as_deref(), Some("Female"));
}

#[test]
fn parse_number_accepts_separators() {
    assert_eq!(parse_number("1,234.5"), Some(1234.5));
    assert_eq!(parse_number(" 42 "), Some(42.0));
    assert_eq!(parse_number("inf"), None);
    assert_eq!(parse_number("abc"), None);
}

#[test]
fn long_layout_skips_years_outside_range() {
    let spec = SourceSpec::long("imm.csv", SourceFormat::default(), "COUNTRYNAME", "YEAR", &["VALUE"])
        .with_combine(Combine::Sum)
        .with_years(YearRange::new(2016, 2020));
    let table = IndicatorTable::new(spec, Arc::new(immunisation_frame())).unwrap();
    let out = reshape(&table).unwrap();
    let recs = out.tables[0].records().unwrap();
    let got: Vec<(String, i32, f64)> = recs.into_iter().map(|r| (r.entity_id, r.year, r.value)).collect();
    assert_eq!(got, vec![("Aland".to_string(), 2016, 70.0)]);
    assert_eq!(out.report.skipped_rows, 3);
    // skipped rows never reach the cell classifier
    assert_eq!(out.report.placeholders, 0);
}

fn stacked_workbook_frame() -> DataFrame {
    DataFrame::new(vec![
        strings("Country", &[Some("Aland"), Some("Borduria"), None, Some("Aland"), Some("Borduria"), Some("Source: x")]),
        strings("2013", &[Some("90"), Some("80"), None, Some("91"), Some("-"), None]),
        strings("2014", &[Some("92"), Some("81"), None, Some("93"), Some("85"), None]),
    ])
    .unwrap()
}

#[test]
fn row_blocks_label_stacked_tables() {
    let spec = SourceSpec::wide("cov.xlsx", SourceFormat::Excel { sheet: None, skip_rows: 0 }, "Country", "Coverage")
        .with_years(YearRange::new(2013, 2014))
        .with_row_blocks(vec![RowBlock::new("Measles", 0, 2), RowBlock::new("DPT", 3, 5)]);
    let table = IndicatorTable::new(spec, Arc::new(stacked_workbook_frame())).unwrap();
    let out = reshape(&table).unwrap();
    let long = &out.tables[0];
    assert!(long.has_category());
    let recs = long.records().unwrap();
    let got: Vec<(String, Option<String>, i32, f64)> =
        recs.into_iter().map(|r| (r.entity_id, r.category, r.year, r.value)).collect();
    assert_eq!(
        got,
        vec![
            ("Aland".to_string(), Some("DPT".to_string()), 2013, 91.0),
            ("Aland".to_string(), Some("DPT".to_string()), 2014, 93.0),
            ("Aland".to_string(), Some("Measles".to_string()), 2013, 90.0),
            ("Aland".to_string(), Some("Measles".to_string()), 2014, 92.0),
            ("Borduria".to_string(), Some("DPT".to_string()), 2014, 85.0),
            ("Borduria".to_string(), Some("Measles".to_string()), 2013, 80.0),
            ("Borduria".to_string(), Some("Measles".to_string()), 2014, 81.0),
        ]
    );
    // the gap row and the footnote row sit outside every block
    assert_eq!(out.report.skipped_rows, 2);
    assert_eq!(out.report.placeholders, 1);
}

#[test]
fn repeated_entity_across_blocks_is_not_a_duplicate() {
    let spec = SourceSpec::wide("cov.xlsx", SourceFormat::Excel { sheet: None, skip_rows: 0 }, "Country", "Coverage")
        .with_years(YearRange::new(2013, 2014));
    let err = IndicatorTable::new(spec.clone(), Arc::new(stacked_workbook_frame())).err().unwrap();
    assert!(matches!(err, DashError::DuplicateKey { .. }));

    let blocked = spec.with_row_blocks(vec![RowBlock::new("Measles", 0, 2), RowBlock::new("DPT", 3, 5)]);
    assert!(IndicatorTable::new(blocked, Arc::new(stacked_workbook_frame())).is_ok());
}

#[test]
fn stacked_value_columns_share_one_indicator() {
    let frame = DataFrame::new(vec![
        strings("Year", &[Some("2000"), Some("2001"), Some("1999")]),
        strings("Spend", &[Some("10"), Some("12"), Some("9")]),
        strings("TB Incidence", &[Some("150"), Some("140"), Some("160")]),
        strings("Measles Incidence", &[Some("40"), Some(""), Some("45")]),
    ])
    .unwrap();
    let spec = SourceSpec::long("merged.csv", SourceFormat::default(), "", "Year", &["TB Incidence", "Measles Incidence"])
        .with_entity("World")
        .with_years(YearRange::new(2000, 2001))
        .stacked_as("Incidence");
    assert_eq!(spec.indicators(), vec!["Incidence".to_string()]);
    let table = IndicatorTable::new(spec, Arc::new(frame)).unwrap();
    let out = reshape(&table).unwrap();
    assert_eq!(out.tables.len(), 1);
    let long = &out.tables[0];
    assert_eq!(long.indicator(), "Incidence");
    assert!(long.has_category());
    let got: Vec<(String, Option<String>, i32, f64)> =
        long.records().unwrap().into_iter().map(|r| (r.entity_id, r.category, r.year, r.value)).collect();
    assert_eq!(
        got,
        vec![
            ("World".to_string(), Some("Measles Incidence".to_string()), 2000, 40.0),
            ("World".to_string(), Some("TB Incidence".to_string()), 2000, 150.0),
            ("World".to_string(), Some("TB Incidence".to_string()), 2001, 140.0),
        ]
    );
    assert_eq!(out.report.blank, 1);
    // 1999 is out of range once per value column
    assert_eq!(out.report.skipped_rows, 2);
}
