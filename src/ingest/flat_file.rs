/// Flat-file flow series: a CSV with a `Date` column followed by a `Flow`
/// column (m³/s), one row per day.
///
/// Column names are checked before any value is parsed. Values are read as
/// found; contiguity, completeness and sign are the validator's business.

use chrono::NaiveDate;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::logging::{self, Stage};
use crate::model::{ExportError, OriginKind, RawRecord, RawSeries, Result, SeriesRole};

/// Canonical date column name (case-sensitive).
pub const DATE_COLUMN: &str = "Date";

/// Canonical discharge column name (case-sensitive).
pub const FLOW_COLUMN: &str = "Flow";

/// Accepted date layouts, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

/// Cell contents treated as a missing discharge value.
const MISSING_MARKERS: &[&str] = &["", "NaN", "nan", "NA", "N/A"];

/// Reads a flow series from a CSV file.
///
/// The whole file is returned; the series label is the file name without
/// its extension. Year selection happens after validation, so a defect
/// anywhere in the file rejects it.
pub fn read_series(path: &Path, role: SeriesRole) -> Result<RawSeries> {
    if !path.is_file() {
        return Err(ExportError::SourceNotFound { role: Some(role), path: path.to_path_buf() });
    }

    let file = File::open(path).map_err(|e| ExportError::io(path, e))?;
    let records = parse_records(BufReader::new(file), path, role)?;

    let label = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    logging::info(
        Stage::FlatFile,
        Some(&label),
        &format!("{} rows read from {}", records.len(), path.display()),
    );

    Ok(RawSeries { role, origin: OriginKind::FlatFile, label, records })
}

/// Parses `Date,Flow` rows from any reader. `path` is only used in errors.
pub fn parse_records<R: Read>(reader: R, path: &Path, role: SeriesRole) -> Result<Vec<RawRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(|e| unreadable(e, path, role))?.clone();
    let names: Vec<String> = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let schema_ok = names.first().map(String::as_str) == Some(DATE_COLUMN)
        && names.get(1).map(String::as_str) == Some(FLOW_COLUMN);
    if !schema_ok {
        return Err(ExportError::Schema { role, path: path.to_path_buf(), found: names });
    }

    let mut records = Vec::new();
    for (idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| unreadable(e, path, role))?;
        // Header is line 1.
        let line = idx + 2;

        let date_text = record.get(0).unwrap_or("");
        if date_text.is_empty() && record.iter().all(str::is_empty) {
            continue;
        }

        let date = parse_date(date_text).ok_or_else(|| ExportError::InvalidData {
            role,
            detail: format!("unreadable date '{}' on line {}", date_text, line),
        })?;

        let discharge = parse_discharge(record.get(1).unwrap_or("")).map_err(|text| {
            ExportError::InvalidData {
                role,
                detail: format!("unreadable flow value '{}' on line {}", text, line),
            }
        })?;

        records.push(RawRecord { date, discharge });
    }

    Ok(records)
}

/// Reader failures on user files are bad input, not environment trouble,
/// unless the underlying read itself failed.
fn unreadable(err: csv::Error, path: &Path, role: SeriesRole) -> ExportError {
    if err.is_io_error() {
        return ExportError::io(path, std::io::Error::from(err));
    }
    let detail = match err.position() {
        Some(pos) => format!("line {}: {}", pos.line(), err),
        None => format!("unreadable CSV: {}", err),
    };
    ExportError::InvalidData { role, detail }
}

/// Parses a date in any of the accepted layouts. A trailing time component
/// (`2000-01-01 00:00:00`) is ignored.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let day_part = text.split([' ', 'T']).next().unwrap_or(text);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day_part, fmt).ok())
}

/// `Ok(None)` for a missing marker, `Ok(Some(v))` for a number, `Err(text)`
/// for anything else.
fn parse_discharge(text: &str) -> std::result::Result<Option<f64>, String> {
    if MISSING_MARKERS.contains(&text) {
        return Ok(None);
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(text.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
