//! IAHRIS daily-series record layout.
//!
//! A document is `;`-separated text with no column-name line:
//!
//! ```text
//! DIARIO;NATURAL;<natural label>                      natural header, 3 fields
//! DIARIO;ALTERADO;<natural label>;<altered label>     altered header, 4 fields
//! 01/01/2000;12.5                                     one row per day
//! ...
//! 01/01/2021;0.00                                     padding row, see below
//! ```
//!
//! Labels are cut to 12 characters. When the last record falls on 31 December
//! a sentinel row dated 1 January of the following year is appended with flow
//! `0.00`; IAHRIS indexes by year and otherwise drops the final complete year.

use chrono::{Datelike, NaiveDate};
use std::path::Path;

use crate::model::{
    ANALYSIS_MODE, ExportError, FlowRecord, FlowSeries, Result, SeriesRole, truncate_label,
};

/// Day format expected by IAHRIS.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Field delimiter expected by IAHRIS.
pub const DELIMITER: u8 = b';';

/// Flow text written on the padding row.
pub const PADDING_FLOW: &str = "0.00";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Observed,
    /// Synthetic 1 January sentinel closing the final complete year.
    Padding,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportRow {
    pub date: NaiveDate,
    pub discharge: f64,
    pub kind: RowKind,
}

/// One series laid out for IAHRIS. Built entirely in memory; written once.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    role: SeriesRole,
    header: Vec<String>,
    rows: Vec<ExportRow>,
}

impl ExportDocument {
    pub fn role(&self) -> SeriesRole {
        self.role
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[ExportRow] {
        &self.rows
    }

    /// True when a padding row was appended.
    pub fn is_padded(&self) -> bool {
        self.rows.last().map(|r| r.kind == RowKind::Padding).unwrap_or(false)
    }

    /// Renders the document as IAHRIS reads it.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .flexible(true)
            .terminator(csv::Terminator::CRLF)
            .from_writer(Vec::new());

        writer.write_record(&self.header)?;
        for row in &self.rows {
            let date = row.date.format(DATE_FORMAT).to_string();
            let flow = match row.kind {
                RowKind::Observed => format_discharge(row.discharge),
                RowKind::Padding => PADDING_FLOW.to_string(),
            };
            writer.write_record([date.as_str(), flow.as_str()])?;
        }

        writer
            .into_inner()
            .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))
    }

    pub fn render(&self) -> Result<String> {
        let bytes = self.to_bytes()?;
        // Labels come from `String`s and everything else is ASCII.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| ExportError::io(path, e))
    }
}

/// Header-and-rows document for the natural (baseline) series.
pub fn natural_document(series: &FlowSeries) -> ExportDocument {
    let header = vec![
        ANALYSIS_MODE.to_string(),
        SeriesRole::Natural.header_tag().to_string(),
        truncate_label(series.label()),
    ];
    ExportDocument { role: SeriesRole::Natural, header, rows: build_rows(series.records()) }
}

/// Document for the altered series. IAHRIS links it to its baseline through
/// the natural label, which must therefore be supplied explicitly.
pub fn altered_document(series: &FlowSeries, natural_label: &str) -> ExportDocument {
    let header = vec![
        ANALYSIS_MODE.to_string(),
        SeriesRole::Altered.header_tag().to_string(),
        truncate_label(natural_label),
        truncate_label(series.label()),
    ];
    ExportDocument { role: SeriesRole::Altered, header, rows: build_rows(series.records()) }
}

/// Deterministic file name for a document: `<label>_nat.csv` / `<label>_alt.csv`.
pub fn export_file_name(label: &str, role: SeriesRole) -> String {
    let safe: String = label
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
        .collect();
    format!("{}_{}.csv", safe, role.file_suffix())
}

/// Shortest decimal text that reads back as the same `f64`, always with a
/// decimal point.
pub fn format_discharge(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') { text } else { format!("{}.0", text) }
}

fn build_rows(records: &[FlowRecord]) -> Vec<ExportRow> {
    let mut rows: Vec<ExportRow> = records
        .iter()
        .map(|r| ExportRow {
            date: r.date,
            // -0.0 passes validation; write it unsigned.
            discharge: if r.discharge == 0.0 { 0.0 } else { r.discharge },
            kind: RowKind::Observed,
        })
        .collect();

    if let Some(last) = records.last() {
        if last.date.month() == 12 && last.date.day() == 31 {
            if let Some(next) = last.date.succ_opt() {
                rows.push(ExportRow { date: next, discharge: 0.0, kind: RowKind::Padding });
            }
        }
    }

    rows
}

// ---------------------------------------------------------------------------
// Reading documents back
// ---------------------------------------------------------------------------

/// A document read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub header: Vec<String>,
    /// Observed rows only; the padding row is reported through `padded`.
    pub rows: Vec<(NaiveDate, f64)>,
    pub padded: bool,
}

/// Parses IAHRIS export text. Used to check files before hand-off.
///
/// A trailing `01/01/YYYY;0.00` row that follows 31 December is the padding
/// sentinel and is not returned as data. Observed zero flow is written as
/// `0.0`, so the literal `0.00` only ever marks padding.
pub fn parse_document(text: &str, role: SeriesRole) -> Result<ParsedDocument> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(first) => first?.iter().map(str::to_string).collect(),
        None => {
            return Err(ExportError::InvalidData { role, detail: "export document is empty".into() });
        }
    };

    let mut rows = Vec::new();
    let mut last_flow_text = String::new();
    for (idx, record) in records.enumerate() {
        let record = record?;
        let line = idx + 2;
        let bad = |what: &str| ExportError::InvalidData {
            role,
            detail: format!("unreadable {} on export line {}", what, line),
        };

        let date = record
            .get(0)
            .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok())
            .ok_or_else(|| bad("date"))?;
        let flow = record
            .get(1)
            .and_then(|q| q.parse::<f64>().ok())
            .ok_or_else(|| bad("flow"))?;
        last_flow_text = record.get(1).unwrap_or_default().to_string();
        rows.push((date, flow));
    }

    let padded = match rows.as_slice() {
        [.., (prev, _), (last, _)] => {
            last_flow_text == PADDING_FLOW
                && last.month() == 1
                && last.day() == 1
                && prev.succ_opt() == Some(*last)
        }
        _ => false,
    };
    if padded {
        rows.pop();
    }

    Ok(ParsedDocument { header, rows, padded })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
