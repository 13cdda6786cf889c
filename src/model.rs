/// Core data types for the SWAT+ → IAHRIS export bridge.
///
/// This module defines the shared domain model imported by all other modules:
/// flow observations, validated daily series, analysis periods and the error
/// taxonomy every pipeline stage reports through. It performs no I/O.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Downstream format constants
// ---------------------------------------------------------------------------

/// Analysis mode written as the first header field. IAHRIS only accepts
/// daily series through this bridge.
pub const ANALYSIS_MODE: &str = "DIARIO";

/// IAHRIS truncates scenario names beyond this many characters.
pub const LABEL_MAX_CHARS: usize = 12;

/// Minimum `end_year - start_year` for an analysis period (15 calendar years).
pub const MIN_PERIOD_SPAN_YEARS: i32 = 14;

// ---------------------------------------------------------------------------
// Series identity
// ---------------------------------------------------------------------------

/// Which side of the hydrologic-alteration comparison a series feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum SeriesRole {
    Natural,
    Altered,
}

impl SeriesRole {
    /// Role tag written into the export header.
    pub fn header_tag(self) -> &'static str {
        match self {
            SeriesRole::Natural => "NATURAL",
            SeriesRole::Altered => "ALTERADO",
        }
    }

    /// Suffix used in export file names (`<label>_nat.csv`).
    pub fn file_suffix(self) -> &'static str {
        match self {
            SeriesRole::Natural => "nat",
            SeriesRole::Altered => "alt",
        }
    }
}

impl fmt::Display for SeriesRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesRole::Natural => write!(f, "natural"),
            SeriesRole::Altered => write!(f, "altered"),
        }
    }
}

/// Where an accepted series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginKind {
    /// `channel_sd_day` rows from a SWAT+ results store.
    ModelOutput,
    /// A user-supplied `Date,Flow` CSV file.
    FlatFile,
}

impl fmt::Display for OriginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginKind::ModelOutput => write!(f, "SWAT+"),
            OriginKind::FlatFile => write!(f, "CSV"),
        }
    }
}

// ---------------------------------------------------------------------------
// Observation types
// ---------------------------------------------------------------------------

/// One validated daily observation. Discharge is in m³/s and never negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowRecord {
    pub date: NaiveDate,
    pub discharge: f64,
}

/// One observation as read from a source, before validation.
///
/// `discharge` is `None` where the source held no value (empty CSV cell,
/// `NaN`, NULL `flo_out`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRecord {
    pub date: NaiveDate,
    pub discharge: Option<f64>,
}

/// A candidate series exactly as a source produced it. Never handed to the
/// formatter; `validate::validate_series` is the only way to a `FlowSeries`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    pub role: SeriesRole,
    pub origin: OriginKind,
    pub label: String,
    pub records: Vec<RawRecord>,
}

/// A validated daily flow series.
///
/// Guaranteed non-empty, strictly increasing by exactly one day, with no
/// missing or negative discharge. Fields are private so that the guarantee
/// cannot be broken after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowSeries {
    role: SeriesRole,
    origin: OriginKind,
    label: String,
    records: Vec<FlowRecord>,
}

impl FlowSeries {
    /// Only the validator builds series; callers must have checked contiguity,
    /// completeness and sign already.
    pub(crate) fn from_validated(
        role: SeriesRole,
        origin: OriginKind,
        label: String,
        records: Vec<FlowRecord>,
    ) -> Self {
        debug_assert!(!records.is_empty());
        Self { role, origin, label, records }
    }

    pub fn role(&self) -> SeriesRole {
        self.role
    }

    pub fn origin(&self) -> OriginKind {
        self.origin
    }

    /// Full display label (scenario name or CSV file stem).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Label as IAHRIS will see it.
    pub fn short_label(&self) -> String {
        truncate_label(&self.label)
    }

    pub fn records(&self) -> &[FlowRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.records[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.records[self.records.len() - 1].date
    }

    /// Year range covered by the records.
    pub fn period(&self) -> AnalysisPeriod {
        AnalysisPeriod::new(self.first_date().year(), self.last_date().year())
    }

    /// The contiguous sub-series falling inside `period`, or `None` when no
    /// record does. Records stay contiguous because the series is.
    pub fn within(&self, period: AnalysisPeriod) -> Option<FlowSeries> {
        let records: Vec<FlowRecord> = self
            .records
            .iter()
            .filter(|r| period.contains(r.date))
            .copied()
            .collect();

        if records.is_empty() {
            return None;
        }

        Some(FlowSeries {
            role: self.role,
            origin: self.origin,
            label: self.label.clone(),
            records,
        })
    }
}

// ---------------------------------------------------------------------------
// Periods
// ---------------------------------------------------------------------------

/// A closed calendar-year range, e.g. 2000..=2020.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisPeriod {
    pub start_year: i32,
    pub end_year: i32,
}

impl AnalysisPeriod {
    pub fn new(start_year: i32, end_year: i32) -> Self {
        Self { start_year, end_year }
    }

    /// `end_year - start_year`; negative for an inverted range.
    pub fn span(&self) -> i32 {
        self.end_year - self.start_year
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start_year..=self.end_year).contains(&date.year())
    }
}

impl fmt::Display for AnalysisPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_year, self.end_year)
    }
}

/// Cuts a label down to the first `LABEL_MAX_CHARS` characters.
///
/// Counts characters, not bytes, so accented scenario names are never split
/// mid-codepoint. Labels already within the limit come back unchanged.
pub fn truncate_label(label: &str) -> String {
    label.chars().take(LABEL_MAX_CHARS).collect()
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// One side of an export whose period fails the minimum-length rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodShortfall {
    pub role: SeriesRole,
    pub period: AnalysisPeriod,
    /// True when the requested period contains no records at all.
    pub empty: bool,
}

impl fmt::Display for PeriodShortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.empty {
            write!(f, "{} period {} contains no records", self.role, self.period)
        } else {
            write!(
                f,
                "{} period {} spans {} years (minimum {})",
                self.role,
                self.period,
                self.period.span(),
                MIN_PERIOD_SPAN_YEARS
            )
        }
    }
}

/// Errors raised while acquiring, validating, reconciling or exporting a
/// pair of flow series.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The scenarios folder, scenario or results store does not exist.
    #[error("{}results store not found: {}", role_prefix(.role), .path.display())]
    SourceNotFound {
        role: Option<SeriesRole>,
        path: PathBuf,
    },

    /// A flat file lacks the `Date`, `Flow` leading columns.
    #[error(
        "{role} flat file {} must have 'Date' as the first column and 'Flow' as the second (found: {})",
        .path.display(),
        .found.join(", ")
    )]
    Schema {
        role: SeriesRole,
        path: PathBuf,
        found: Vec<String>,
    },

    /// Dates are not one calendar day apart (gap, duplicate or reordering).
    #[error("{role} series is not a gap-free daily series: {detail}")]
    InvalidFrequency { role: SeriesRole, detail: String },

    /// Missing, negative or unreadable discharge, or an unreadable date.
    #[error("{role} series has invalid flow data: {detail}")]
    InvalidData { role: SeriesRole, detail: String },

    /// One or both analysis periods are shorter than 15 calendar years.
    #[error(
        "selected periods must cover at least 15 consecutive years: {}",
        join_shortfalls(.shortfalls)
    )]
    InsufficientPeriod { shortfalls: Vec<PeriodShortfall> },

    /// The scenario has no daily channel output for the unit.
    #[error(
        "{}'channel_sd_day' has no rows{} in scenario '{scenario}'; enable Daily > Model Components > Channel in the SWAT+ print settings",
        role_prefix(.role),
        unit_suffix(.unit)
    )]
    MissingUnitData {
        role: Option<SeriesRole>,
        scenario: String,
        unit: Option<String>,
    },

    /// Export attempted before both sides were acquired.
    #[error("no {0} series has been acquired; both natural and altered series are required")]
    SeriesNotAcquired(SeriesRole),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("results store query failed: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ExportError {
    /// The series role the error concerns, when there is one.
    pub fn role(&self) -> Option<SeriesRole> {
        match self {
            ExportError::SourceNotFound { role, .. } | ExportError::MissingUnitData { role, .. } => {
                *role
            }
            ExportError::Schema { role, .. }
            | ExportError::InvalidFrequency { role, .. }
            | ExportError::InvalidData { role, .. } => Some(*role),
            ExportError::SeriesNotAcquired(role) => Some(*role),
            _ => None,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;

fn role_prefix(role: &Option<SeriesRole>) -> String {
    role.map(|r| format!("{} ", r)).unwrap_or_default()
}

fn unit_suffix(unit: &Option<String>) -> String {
    unit.as_ref().map(|u| format!(" for unit {}", u)).unwrap_or_default()
}

fn join_shortfalls(shortfalls: &[PeriodShortfall]) -> String {
    shortfalls
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
