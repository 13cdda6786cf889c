/// SWAT+ results store access.
///
/// A SWAT+ project keeps one folder per scenario under `Scenarios/`; each
/// scenario that has been run holds its outputs in
/// `Results/swatplus_output.sqlite`. Daily channel discharge lives in the
/// `channel_sd_day` table (`unit`, `yr`, `mon`, `day`, `flo_out`), which
/// only exists when the model run printed daily channel output.
///
/// Stores are opened read-only; nothing here writes to a scenario.

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::logging::{self, Stage};
use crate::model::{AnalysisPeriod, ExportError, OriginKind, RawRecord, RawSeries, Result, SeriesRole};

/// Relative location of the results store inside a scenario folder.
pub const RESULTS_DB: &str = "Results/swatplus_output.sqlite";

/// Day-level channel output relation.
pub const CHANNEL_DAY_TABLE: &str = "channel_sd_day";

/// Units and year range available in one scenario.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChannelCatalog {
    pub scenario: String,
    pub units: Vec<String>,
    pub first_year: i32,
    pub last_year: i32,
}

impl ChannelCatalog {
    pub fn period(&self) -> AnalysisPeriod {
        AnalysisPeriod::new(self.first_year, self.last_year)
    }
}

/// A SWAT+ `Scenarios` folder.
#[derive(Debug, Clone)]
pub struct ScenarioStore {
    scenarios_dir: PathBuf,
}

impl ScenarioStore {
    /// Opens a `Scenarios` folder. The folder must exist and be named
    /// `...Scenarios`, the way SWAT+ Editor lays out projects.
    pub fn open(scenarios_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = scenarios_dir.as_ref();
        let named_scenarios = dir
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with("Scenarios"))
            .unwrap_or(false);

        if !dir.is_dir() || !named_scenarios {
            return Err(ExportError::SourceNotFound { role: None, path: dir.to_path_buf() });
        }

        Ok(Self { scenarios_dir: dir.to_path_buf() })
    }

    pub fn scenarios_dir(&self) -> &Path {
        &self.scenarios_dir
    }

    /// Path of a scenario's results store (which may not exist).
    pub fn results_path(&self, scenario: &str) -> PathBuf {
        self.scenarios_dir.join(scenario).join(RESULTS_DB)
    }

    /// Scenario sub-folder names, sorted.
    pub fn list_scenarios(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.scenarios_dir)
            .map_err(|e| ExportError::io(&self.scenarios_dir, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ExportError::io(&self.scenarios_dir, e))?;
            let is_dir = entry
                .file_type()
                .map_err(|e| ExportError::io(entry.path(), e))?
                .is_dir();
            if is_dir {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Distinct channel units plus the first and last simulated year.
    ///
    /// A store without `channel_sd_day`, or with an empty one, is reported as
    /// `MissingUnitData`: the scenario was run without daily channel printing.
    pub fn describe_channels(&self, scenario: &str) -> Result<ChannelCatalog> {
        let conn = self.connect(scenario, None)?;
        let missing = || ExportError::MissingUnitData {
            role: None,
            scenario: scenario.to_string(),
            unit: None,
        };

        if !has_table(&conn, CHANNEL_DAY_TABLE)? {
            return Err(missing());
        }

        let mut stmt = conn.prepare("SELECT DISTINCT unit FROM channel_sd_day")?;
        let mut units = stmt
            .query_map([], |row| row.get::<_, Value>(0))?
            .map(|v| v.map(|v| value_to_string(&v)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        units.sort_by(|a, b| compare_units(a, b));

        let (first, last): (Option<i32>, Option<i32>) =
            conn.query_row("SELECT MIN(yr), MAX(yr) FROM channel_sd_day", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;

        match (first, last) {
            (Some(first_year), Some(last_year)) if !units.is_empty() => Ok(ChannelCatalog {
                scenario: scenario.to_string(),
                units,
                first_year,
                last_year,
            }),
            _ => Err(missing()),
        }
    }

    /// Daily `flo_out` for one unit, ordered by (yr, mon, day).
    ///
    /// `period` narrows the query to those years; `None` reads every year.
    pub fn fetch_series(
        &self,
        role: SeriesRole,
        scenario: &str,
        unit: &str,
        period: Option<AnalysisPeriod>,
    ) -> Result<RawSeries> {
        let conn = self.connect(scenario, Some(role))?;
        let missing = || ExportError::MissingUnitData {
            role: Some(role),
            scenario: scenario.to_string(),
            unit: Some(unit.to_string()),
        };

        if !has_table(&conn, CHANNEL_DAY_TABLE)? {
            return Err(missing());
        }

        let (start_year, end_year) = match period {
            Some(p) => (p.start_year, p.end_year),
            None => (i32::MIN, i32::MAX),
        };

        let query = "
            SELECT yr, mon, day, flo_out
            FROM channel_sd_day
            WHERE unit = ?1 AND yr BETWEEN ?2 AND ?3
            ORDER BY yr, mon, day
        ";

        let mut stmt = conn.prepare(query)?;
        let mut rows = stmt.query(params![unit, start_year, end_year])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let yr: i32 = row.get(0)?;
            let mon: u32 = row.get(1)?;
            let day: u32 = row.get(2)?;
            let discharge: Option<f64> = row.get(3)?;

            let date = NaiveDate::from_ymd_opt(yr, mon, day).ok_or_else(|| ExportError::InvalidData {
                role,
                detail: format!("impossible date {:04}-{:02}-{:02} in {}", yr, mon, day, CHANNEL_DAY_TABLE),
            })?;

            records.push(RawRecord { date, discharge });
        }

        if records.is_empty() {
            return Err(missing());
        }

        logging::info(
            Stage::Swat,
            Some(scenario),
            &format!("unit {}: {} daily rows from {}", unit, records.len(), CHANNEL_DAY_TABLE),
        );

        Ok(RawSeries {
            role,
            origin: OriginKind::ModelOutput,
            label: scenario.to_string(),
            records,
        })
    }

    fn connect(&self, scenario: &str, role: Option<SeriesRole>) -> Result<Connection> {
        let path = self.results_path(scenario);
        // Opening a missing file read-only fails anyway, but check first so the
        // error names the path rather than an SQLite code.
        if !path.is_file() {
            return Err(ExportError::SourceNotFound { role, path });
        }

        // SQLite opens lazily; touching the schema is what fails on a file
        // that is not a results store.
        let not_a_store = |e: rusqlite::Error| {
            logging::debug(Stage::Swat, Some(scenario), &format!("{}: {}", path.display(), e));
            ExportError::SourceNotFound { role, path: path.clone() }
        };
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| not_a_store(e))?;
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
            .map_err(|e| not_a_store(e))?;
        Ok(conn)
    }
}

/// Fills in the role on a role-less `SourceNotFound` raised while opening
/// the `Scenarios` folder for a specific series.
pub(crate) fn attach_role(err: ExportError, role: SeriesRole) -> ExportError {
    match err {
        ExportError::SourceNotFound { role: None, path } => {
            ExportError::SourceNotFound { role: Some(role), path }
        }
        other => other,
    }
}

fn has_table(conn: &Connection, table: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Numeric ids by value, then any non-numeric ids in text order.
fn compare_units(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Null => String::new(),
        Value::Blob(b) => String::from_utf8_lossy(b).into_owned(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
