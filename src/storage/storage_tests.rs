use super::*;

fn write(dir: &Path, name: &str, text: &str) {
    std::fs::write(dir.join(name), text).unwrap();
}

fn store(dir: &Path) -> SourceStore { SourceStore::new(dir, TableCache::new()) }

#[test]
fn test_load_wide_source_validates_years() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "h.csv", "Country Name,Country Code,1999,2000,2001\nAruba,ABW,1,2,3\nChad,TCD,,5,-\n");
    let spec = SourceSpec::wide("h.csv", SourceFormat::default(), "Country Code", "Health")
        .with_name_column("Country Name");
    let table = store(tmp.path()).load(&spec).unwrap();
    assert_eq!(table.height(), 2);
    let years: Vec<i32> = table.year_columns().iter().map(|(_, y)| *y).collect();
    assert_eq!(years, vec![2000, 2001]);
}

#[test]
fn test_missing_identifier_column_is_parse_error() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "h.csv", "Country Name,2000\nAruba,1\n");
    let spec = SourceSpec::wide("h.csv", SourceFormat::default(), "Country Code", "Health")
        .with_name_column("Country Name");
    match store(tmp.path()).load(&spec) {
        Err(DashError::Parse { missing, .. }) => assert_eq!(missing, vec!["Country Code".to_string()]),
        other => panic!("expected parse error, got {:?}", other.err()),
    }
}

#[test]
fn test_no_year_columns_in_range() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "h.csv", "Country Code,1990,1991\nABW,1,2\n");
    let spec = SourceSpec::wide("h.csv", SourceFormat::default(), "Country Code", "Health");
    let err = store(tmp.path()).load(&spec).err().unwrap();
    assert!(matches!(err, DashError::Parse { .. }));
    assert!(err.to_string().contains("2000"));
}

#[test]
fn test_duplicate_entity_rejected_unless_summed() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "imm.csv", "COUNTRYNAME,YEAR,VALUE\nLaos,2015,1\nLaos,2015,2\nLaos,2016,4\n");
    let spec = SourceSpec::long("imm.csv", SourceFormat::default(), "COUNTRYNAME", "YEAR", &["VALUE"]);
    let st = store(tmp.path());
    match st.load(&spec) {
        Err(DashError::DuplicateKey { key, .. }) => assert!(key.contains("Laos") && key.contains("2015")),
        other => panic!("expected duplicate key, got {:?}", other.err()),
    }
    let summed = spec.clone().with_combine(Combine::Sum);
    assert_eq!(st.load(&summed).unwrap().height(), 3);
}

#[test]
fn test_category_is_part_of_the_key() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "m.csv", "Country,Disease,2000\nLaos,Measles,1\nLaos,Rubella,2\n");
    let spec = SourceSpec::wide("m.csv", SourceFormat::default(), "Country", "Cases").with_category_column("Disease");
    assert!(store(tmp.path()).load(&spec).is_ok());
}

#[test]
fn test_cache_returns_same_table() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "h.csv", "Country Code,2000\nABW,1\n");
    let st = store(tmp.path());
    let spec = SourceSpec::wide("h.csv", SourceFormat::default(), "Country Code", "Health");
    let a = st.load(&spec).unwrap();
    // Changing the file on disk is not observed: the cache has no invalidation.
    write(tmp.path(), "h.csv", "Country Code,2000\nABW,1\nTCD,2\n");
    let b = st.load(&spec).unwrap();
    assert_eq!(a.height(), 1);
    assert_eq!(b.height(), 1);
    assert_eq!(st.cache().keys(), vec!["h.csv#skip=0".to_string()]);
}

#[test]
fn test_missing_source_not_cached() {
    let tmp = tempfile::tempdir().unwrap();
    let st = store(tmp.path());
    let spec = SourceSpec::wide("absent.csv", SourceFormat::default(), "Country Code", "Health");
    assert!(matches!(st.load(&spec), Err(DashError::SourceNotFound { .. })));
    assert!(st.cache().is_empty());
}

#[test]
fn test_metadata_table_skips_blank_ids() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "meta.csv", "Country Code,Region,IncomeGroup\nABW,Latin America,High income\n,Aggregate,\nAFE,,\n");
    let spec = MetadataSpec {
        locator: "meta.csv".into(),
        format: SourceFormat::default(),
        id_column: "Country Code".into(),
        region_column: Some("Region".into()),
        income_group_column: Some("IncomeGroup".into()),
    };
    let meta = store(tmp.path()).load_metadata(&spec).unwrap();
    assert_eq!(meta.frame().height(), 2);
    assert_eq!(meta.attributes(), vec!["region".to_string(), "income_group".to_string()]);
    let income = string_column(meta.frame(), MetadataTable::INCOME_GROUP).unwrap();
    assert_eq!(income, vec![Some("High income".to_string()), None]);
}

#[test]
fn test_header_override_renames_after_cache() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "cov.csv", "Immunisation coverage,Note,Source\nLaos,80,82\nChad,60,61\n");
    let st = store(tmp.path());
    let spec = SourceSpec::wide("cov.csv", SourceFormat::default(), "Country", "Coverage")
        .with_header(&["Country", "2013", "2014"])
        .with_years(YearRange::new(2013, 2014));
    let table = st.load(&spec).unwrap();
    assert_eq!(table.height(), 2);
    let years: Vec<i32> = table.year_columns().iter().map(|(_, y)| *y).collect();
    assert_eq!(years, vec![2013, 2014]);

    // the same file without the override is missing its identifier column
    let plain = SourceSpec::wide("cov.csv", SourceFormat::default(), "Country", "Coverage");
    assert!(matches!(st.load(&plain), Err(DashError::Parse { .. })));
    assert_eq!(st.cache().keys(), vec!["cov.csv#skip=0".to_string()]);
}

#[test]
fn test_fixed_entity_needs_no_id_column() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "world.csv", "Year,TB Incidence\n2000,150\n2001,140\n");
    let spec = SourceSpec::long("world.csv", SourceFormat::default(), "", "Year", &["TB Incidence"]).with_entity("World");
    let table = store(tmp.path()).load(&spec).unwrap();
    assert_eq!(table.row_ids().unwrap(), vec![Some("World".to_string()); 2]);
    assert!(table.row_categories().unwrap().is_none());

    let conflicting = spec.with_category_column("Year").stacked_as("Incidence");
    assert!(matches!(store(tmp.path()).load(&conflicting), Err(DashError::Parse { .. })));
}
