use migration_indicators::config::{Paths, HEATMAP_COLUMNS};
use migration_indicators::data::{column_as_f64, column_as_i64, write_csv, KNIFE_CATEGORY_COLUMNS};
use migration_indicators::pipeline;
use migration_indicators::stats::StatsCalculator;
use std::fs;
use tempfile::TempDir;

const MIGRATION: &str = "\
Year,Immigration,Emigration,GDP,Unemployment
2013,500,300,1.0,7.5
2014,520,310,2.0,6.1
2015,560,n/a,2.5,5.3
2024,600,330,,4.2
";

fn knife_csv() -> String {
    let mut text = format!("Year,{}\n", KNIFE_CATEGORY_COLUMNS.join(","));
    text.push_str("2013,10,20,5,5\n");
    text.push_str("2024,90,5,3,2\n");
    text.push_str("2015,30,,10,10\n");
    text.push_str("2024,50,50,50,50\n");
    text.push_str(",1,1,1,1\n");
    text
}

fn workspace() -> (TempDir, Paths) {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::under(dir.path());
    fs::create_dir_all(&paths.data_dir).unwrap();
    fs::write(paths.migration_csv(), MIGRATION).unwrap();
    fs::write(paths.knife_csv(), knife_csv()).unwrap();
    paths.ensure_output_dirs().unwrap();
    (dir, paths)
}

#[test]
fn migration_table_gains_net_migration() {
    let (_dir, paths) = workspace();
    let df = pipeline::prepare_migration_table(&paths.migration_csv()).unwrap();

    assert_eq!(
        column_as_f64(&df, "Net_Migration").unwrap(),
        vec![Some(200.0), Some(210.0), None, Some(270.0)]
    );
}

#[test]
fn constant_net_migration_correlates_as_nan() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("two_years.csv");
    fs::write(&path, "Year,Immigration,Emigration\n2000,100,80\n2001,110,90\n").unwrap();

    let df = pipeline::prepare_migration_table(&path).unwrap();
    assert_eq!(
        column_as_f64(&df, "Net_Migration").unwrap(),
        vec![Some(20.0), Some(20.0)]
    );

    let matrix = StatsCalculator::correlation_matrix(&df, &HEATMAP_COLUMNS).unwrap();
    assert_eq!(matrix.columns, vec!["Immigration", "Emigration", "Net_Migration"]);
    assert_eq!(matrix.get(0, 0), 1.0);
    assert!((matrix.get(0, 1) - 1.0).abs() < 1e-12);
    // Zero variance leaves the whole Net_Migration row and column undefined.
    for k in 0..3 {
        assert!(matrix.get(2, k).is_nan());
        assert!(matrix.get(k, 2).is_nan());
    }
}

#[test]
fn knife_crime_is_repaired_and_merged() {
    let (_dir, paths) = workspace();
    let merged = pipeline::prepare_knifecrime_emigration(&paths).unwrap();

    let names: Vec<String> = merged
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(names, vec!["Year", "Emigration", "Knife_Crime_Total"]);

    assert_eq!(
        column_as_i64(&merged, "Year").unwrap(),
        vec![Some(2013), Some(2014), Some(2015), Some(2024)]
    );
    // The smaller of the two 2024 rows (100) becomes 2014.
    assert_eq!(
        column_as_f64(&merged, "Knife_Crime_Total").unwrap(),
        vec![Some(40.0), Some(100.0), Some(50.0), Some(200.0)]
    );
    assert_eq!(
        column_as_f64(&merged, "Emigration").unwrap(),
        vec![Some(300.0), Some(310.0), None, Some(330.0)]
    );
}

#[test]
fn derived_csv_has_expected_header() {
    let (_dir, paths) = workspace();
    let mut merged = pipeline::prepare_knifecrime_emigration(&paths).unwrap();
    write_csv(&mut merged, &paths.derived_csv()).unwrap();

    let text = fs::read_to_string(paths.derived_csv()).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Year,Emigration,Knife_Crime_Total"));
    assert_eq!(lines.count(), 4);
}

#[test]
fn missing_input_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::under(dir.path());
    assert!(pipeline::prepare_knifecrime_emigration(&paths).is_err());
}

#[test]
fn full_runs_write_every_output() {
    let (_dir, paths) = workspace();

    let matrix = pipeline::run_correlation_heatmap(&paths).unwrap();
    assert_eq!(
        matrix.columns,
        vec!["Immigration", "Emigration", "Net_Migration", "GDP", "Unemployment"]
    );

    pipeline::run_knifecrime_emigration(&paths).unwrap();
    for path in [
        paths.heatmap_png(),
        paths.timeline_png(),
        paths.scatter_png(),
        paths.derived_csv(),
    ] {
        assert!(path.is_file(), "{} missing", path.display());
    }
}
