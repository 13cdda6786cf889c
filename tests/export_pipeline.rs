/// End-to-end tests for the export pipeline
///
/// These tests build a SWAT+ project layout on disk
/// (`Scenarios/<scenario>/Results/swatplus_output.sqlite`) plus plain
/// `Date,Flow` CSV files, then drive the coordinator exactly as the CLI does:
/// 1. SWAT+ natural and altered series exported with headers and padding
/// 2. Written files read back to the same daily pairs
/// 3. Mixed SWAT+/CSV sources with period narrowing
/// 4. Rejected inputs leave the work directory untouched
///
/// Run with: cargo test --test export_pipeline

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rusqlite::{Connection, params};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use iahris_bridge::export::format::{export_file_name, parse_document};
use iahris_bridge::export::{ExportCoordinator, ExportHandoff};
use iahris_bridge::ingest::swat::ScenarioStore;
use iahris_bridge::model::{AnalysisPeriod, ExportError, SeriesRole};
use iahris_bridge::request::{ExportRequest, SeriesRequest};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn fixed_now() -> NaiveDateTime {
    day(2025, 5, 14).and_hms_opt(9, 30, 0).unwrap()
}

/// Deterministic discharge for the i-th day of a series.
fn flow_for(i: usize, unit: i64) -> f64 {
    unit as f64 + (i % 365) as f64 / 8.0
}

/// Writes `swatplus_output.sqlite` for one scenario with daily rows for each
/// unit over `first..=last`.
fn write_scenario(scenarios: &Path, scenario: &str, units: &[i64], first: NaiveDate, last: NaiveDate) {
    let results = scenarios.join(scenario).join("Results");
    std::fs::create_dir_all(&results).unwrap();

    let mut conn = Connection::open(results.join("swatplus_output.sqlite")).unwrap();
    conn.execute_batch(
        "CREATE TABLE channel_sd_day (
            jday INTEGER, mon INTEGER, day INTEGER, yr INTEGER,
            unit INTEGER, gis_id INTEGER, name TEXT, flo_out REAL
        );",
    )
    .unwrap();

    let tx = conn.transaction().unwrap();
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO channel_sd_day (jday, mon, day, yr, unit, gis_id, name, flo_out)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5, 'cha' || ?5, ?6)",
            )
            .unwrap();
        for &unit in units {
            for (i, d) in first.iter_days().take_while(|d| *d <= last).enumerate() {
                stmt.execute(params![d.ordinal(), d.month(), d.day(), d.year(), unit, flow_for(i, unit)])
                    .unwrap();
            }
        }
    }
    tx.commit().unwrap();
}

fn write_csv(dir: &Path, name: &str, first: NaiveDate, last: NaiveDate) -> PathBuf {
    let mut text = String::from("Date,Flow\n");
    for (i, d) in first.iter_days().take_while(|d| *d <= last).enumerate() {
        writeln!(text, "{},{}", d.format("%Y-%m-%d"), flow_for(i, 0)).unwrap();
    }
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn run_export(work_dir: &Path, request: &ExportRequest) -> Result<ExportHandoff, ExportError> {
    let mut coordinator = ExportCoordinator::new(work_dir);
    coordinator.acquire(&request.natural)?;
    coordinator.acquire(&request.altered)?;
    coordinator.export_at(None, None, fixed_now())
}

fn dir_is_empty_or_missing(dir: &Path) -> bool {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}

// ---------------------------------------------------------------------------
// SWAT+ to IAHRIS
// ---------------------------------------------------------------------------

#[test]
fn test_swat_pair_exports_headers_rows_and_padding() {
    let tmp = TempDir::new().unwrap();
    let scenarios = tmp.path().join("Scenarios");
    write_scenario(&scenarios, "ScenarioNat12X", &[5, 7], day(2000, 1, 1), day(2020, 12, 31));
    write_scenario(&scenarios, "AltB", &[5], day(2000, 1, 1), day(2020, 12, 31));

    let request = ExportRequest::new(
        SeriesRequest::model_output(SeriesRole::Natural, &scenarios, "ScenarioNat12X", "5"),
        SeriesRequest::model_output(SeriesRole::Altered, &scenarios, "AltB", "5"),
    );
    let out = tmp.path().join("temp");
    let handoff = run_export(&out, &request).expect("export should succeed");

    assert_eq!(handoff.natural_label, "ScenarioNat1");
    assert_eq!(handoff.altered_label, "AltB");
    assert_eq!(handoff.project_id, "2025-05-14_09-30");
    assert_eq!(handoff.natural_period, AnalysisPeriod::new(2000, 2020));
    assert_eq!(handoff.altered_period, AnalysisPeriod::new(2000, 2020));
    assert_eq!(handoff.natural_path, out.join(export_file_name("ScenarioNat12X", SeriesRole::Natural)));
    assert_eq!(handoff.altered_path, out.join("AltB_alt.csv"));

    let nat = std::fs::read_to_string(&handoff.natural_path).unwrap();
    let nat_lines: Vec<&str> = nat.lines().collect();
    assert_eq!(nat_lines[0], "DIARIO;NATURAL;ScenarioNat1");
    assert_eq!(nat_lines.len(), 1 + 7671 + 1, "header + 7671 days + padding row");
    assert!(nat_lines[1].starts_with("01/01/2000;"));
    assert!(nat_lines[7671].starts_with("31/12/2020;"));
    assert_eq!(nat_lines[7672], "01/01/2021;0.00");

    let alt = std::fs::read_to_string(&handoff.altered_path).unwrap();
    let alt_lines: Vec<&str> = alt.lines().collect();
    assert_eq!(alt_lines[0], "DIARIO;ALTERADO;ScenarioNat1;AltB");
    assert_eq!(alt_lines.len(), 7673);
    assert_eq!(alt_lines.last().copied(), Some("01/01/2021;0.00"));
}

#[test]
fn test_written_files_read_back_to_source_values() {
    let tmp = TempDir::new().unwrap();
    let scenarios = tmp.path().join("Scenarios");
    write_scenario(&scenarios, "Default", &[3], day(1995, 1, 1), day(2010, 12, 31));
    write_scenario(&scenarios, "Dam", &[3], day(1995, 1, 1), day(2010, 12, 31));

    let request = ExportRequest::new(
        SeriesRequest::model_output(SeriesRole::Natural, &scenarios, "Default", "3"),
        SeriesRequest::model_output(SeriesRole::Altered, &scenarios, "Dam", "3"),
    );
    let handoff = run_export(&tmp.path().join("out"), &request).unwrap();

    let text = std::fs::read_to_string(&handoff.natural_path).unwrap();
    let parsed = parse_document(&text, SeriesRole::Natural).unwrap();
    assert_eq!(parsed.header, vec!["DIARIO", "NATURAL", "Default"]);

    assert!(parsed.padded, "a 31 December end carries the padding row");
    let observed = &parsed.rows;
    assert_eq!(observed.len(), 5844);
    for (i, (date, flow)) in observed.iter().enumerate() {
        assert_eq!(*flow, flow_for(i, 3), "discharge on {} must survive export unchanged", date);
    }
    assert_eq!(observed.first().map(|r| r.0), Some(day(1995, 1, 1)));
    assert_eq!(observed.last().map(|r| r.0), Some(day(2010, 12, 31)));
}

#[test]
fn test_catalog_lists_units_and_years() {
    let tmp = TempDir::new().unwrap();
    let scenarios = tmp.path().join("Scenarios");
    write_scenario(&scenarios, "Default", &[12, 2], day(2001, 1, 1), day(2003, 12, 31));
    std::fs::create_dir_all(scenarios.join("Empty")).unwrap();

    let store = ScenarioStore::open(&scenarios).unwrap();
    assert_eq!(store.list_scenarios().unwrap(), vec!["Default", "Empty"]);

    let catalog = store.describe_channels("Default").unwrap();
    assert_eq!(catalog.units, vec!["2", "12"]);
    assert_eq!(catalog.period(), AnalysisPeriod::new(2001, 2003));

    let err = store.describe_channels("Empty").unwrap_err();
    assert!(matches!(err, ExportError::SourceNotFound { .. }), "got {:?}", err);
}

// ---------------------------------------------------------------------------
// Mixed sources and period narrowing
// ---------------------------------------------------------------------------

#[test]
fn test_swat_natural_with_csv_altered() {
    let tmp = TempDir::new().unwrap();
    let scenarios = tmp.path().join("Scenarios");
    write_scenario(&scenarios, "Default", &[1], day(1990, 1, 1), day(2020, 12, 31));
    let alt_csv = write_csv(tmp.path(), "gauge_downstream.csv", day(2001, 10, 1), day(2019, 9, 30));

    let request = ExportRequest::new(
        SeriesRequest::model_output(SeriesRole::Natural, &scenarios, "Default", "1")
            .with_period(AnalysisPeriod::new(1990, 2005)),
        SeriesRequest::flat_file(SeriesRole::Altered, &alt_csv),
    );
    let handoff = run_export(&tmp.path().join("out"), &request).unwrap();

    assert_eq!(handoff.natural_period, AnalysisPeriod::new(1990, 2005));
    assert_eq!(handoff.altered_period, AnalysisPeriod::new(2001, 2019));
    assert_eq!(handoff.altered_label, "gauge_downst");

    let alt = std::fs::read_to_string(&handoff.altered_path).unwrap();
    assert!(alt.starts_with("DIARIO;ALTERADO;Default;gauge_downst\r\n"));
    assert!(alt.lines().nth(1).unwrap().starts_with("01/10/2001;"));
    assert!(alt.lines().last().unwrap().starts_with("30/09/2019;"), "no padding after a September end");

    let nat = std::fs::read_to_string(&handoff.natural_path).unwrap();
    assert_eq!(nat.lines().last(), Some("01/01/2006;0.00"));
}

#[test]
fn test_export_narrowing_below_fourteen_years_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let nat = write_csv(tmp.path(), "nat.csv", day(1980, 1, 1), day(2000, 12, 31));
    let alt = write_csv(tmp.path(), "alt.csv", day(1980, 1, 1), day(2000, 12, 31));
    let out = tmp.path().join("out");

    let mut coordinator = ExportCoordinator::new(&out);
    coordinator.acquire(&SeriesRequest::flat_file(SeriesRole::Natural, nat)).unwrap();
    coordinator.acquire(&SeriesRequest::flat_file(SeriesRole::Altered, alt)).unwrap();

    let err = coordinator
        .export_at(Some(AnalysisPeriod::new(1980, 1993)), Some(AnalysisPeriod::new(1990, 1995)), fixed_now())
        .unwrap_err();
    match err {
        ExportError::InsufficientPeriod { shortfalls } => {
            let roles: Vec<_> = shortfalls.iter().map(|s| s.role).collect();
            assert_eq!(roles, vec![SeriesRole::Natural, SeriesRole::Altered], "both sides reported");
        }
        other => panic!("expected InsufficientPeriod, got {:?}", other),
    }
    assert!(dir_is_empty_or_missing(&out));

    // Fourteen years on each side is enough.
    coordinator
        .export_at(Some(AnalysisPeriod::new(1980, 1994)), Some(AnalysisPeriod::new(1986, 2000)), fixed_now())
        .expect("fourteen-year spans are accepted");
}

// ---------------------------------------------------------------------------
// Rejected inputs
// ---------------------------------------------------------------------------

#[test]
fn test_scenario_without_channel_table_is_upstream_problem() {
    let tmp = TempDir::new().unwrap();
    let scenarios = tmp.path().join("Scenarios");
    let results = scenarios.join("NoDaily").join("Results");
    std::fs::create_dir_all(&results).unwrap();
    Connection::open(results.join("swatplus_output.sqlite"))
        .unwrap()
        .execute_batch("CREATE TABLE channel_sd_yr (unit INTEGER, yr INTEGER, flo_out REAL);")
        .unwrap();
    let alt = write_csv(tmp.path(), "alt.csv", day(2000, 1, 1), day(2020, 12, 31));

    let request = ExportRequest::new(
        SeriesRequest::model_output(SeriesRole::Natural, &scenarios, "NoDaily", "1"),
        SeriesRequest::flat_file(SeriesRole::Altered, alt),
    );
    let out = tmp.path().join("out");
    let err = run_export(&out, &request).unwrap_err();

    assert!(matches!(err, ExportError::MissingUnitData { role: Some(SeriesRole::Natural), .. }), "got {:?}", err);
    assert!(dir_is_empty_or_missing(&out));
}

#[test]
fn test_csv_with_gap_is_rejected_before_anything_is_written() {
    let tmp = TempDir::new().unwrap();
    let nat = write_csv(tmp.path(), "nat.csv", day(2000, 1, 1), day(2020, 12, 31));
    let alt = tmp.path().join("alt.csv");
    std::fs::write(&alt, "Date,Flow\n2000-01-01,1.0\n2000-01-02,1.5\n2000-01-05,2.0\n").unwrap();

    let request = ExportRequest::new(
        SeriesRequest::flat_file(SeriesRole::Natural, nat),
        SeriesRequest::flat_file(SeriesRole::Altered, alt),
    );
    let out = tmp.path().join("out");
    let err = run_export(&out, &request).unwrap_err();

    assert!(matches!(err, ExportError::InvalidFrequency { role: SeriesRole::Altered, .. }), "got {:?}", err);
    assert!(dir_is_empty_or_missing(&out));
}

#[test]
fn test_handoff_serializes_for_downstream_invocation() {
    let tmp = TempDir::new().unwrap();
    let nat = write_csv(tmp.path(), "Natural.csv", day(2000, 1, 1), day(2014, 12, 31));
    let alt = write_csv(tmp.path(), "Altered.csv", day(2000, 1, 1), day(2014, 12, 31));

    let request = ExportRequest::new(
        SeriesRequest::flat_file(SeriesRole::Natural, nat).with_label("Rio Jucar natural"),
        SeriesRequest::flat_file(SeriesRole::Altered, alt),
    );
    let handoff = run_export(&tmp.path().join("out"), &request).unwrap();
    let json: serde_json::Value = serde_json::to_value(&handoff).unwrap();

    assert_eq!(json["natural_label"], "Rio Jucar na");
    assert_eq!(json["altered_label"], "Altered");
    assert_eq!(json["project_id"], "2025-05-14_09-30");
    assert_eq!(json["natural_period"]["start_year"], 2000);
    assert_eq!(json["natural_period"]["end_year"], 2014);
    assert!(json["natural_path"].as_str().unwrap().ends_with("Rio Jucar natural_nat.csv"));
}
