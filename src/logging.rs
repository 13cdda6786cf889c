/// Structured logging for the export bridge
///
/// Every event carries the pipeline stage it came from and, where there is
/// one, the series label or scenario it concerns. Events go through
/// `tracing`; `init_logger` installs a console sink and an optional
/// append-only log file.

use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt as tfmt, prelude::*};

use crate::model::{ExportError, OriginKind};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Swat,
    FlatFile,
    Validate,
    Period,
    Export,
    System,
}

impl Stage {
    pub fn for_origin(origin: OriginKind) -> Self {
        match origin {
            OriginKind::ModelOutput => Stage::Swat,
            OriginKind::FlatFile => Stage::FlatFile,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Swat => write!(f, "SWAT"),
            Stage::FlatFile => write!(f, "CSV"),
            Stage::Validate => write!(f, "VALID"),
            Stage::Period => write!(f, "PERIOD"),
            Stage::Export => write!(f, "EXPORT"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// The user can fix it by picking another source or period.
    InputCorrectable,
    /// The upstream SWAT+ run did not produce the required output.
    UpstreamConfiguration,
    /// Disk, storage engine or configuration trouble on this machine.
    Environment,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::InputCorrectable => write!(f, "INPUT"),
            FailureType::UpstreamConfiguration => write!(f, "UPSTREAM"),
            FailureType::Environment => write!(f, "ENV"),
        }
    }
}

pub fn classify_failure(err: &ExportError) -> FailureType {
    match err {
        ExportError::SourceNotFound { .. }
        | ExportError::Schema { .. }
        | ExportError::InvalidFrequency { .. }
        | ExportError::InvalidData { .. }
        | ExportError::InsufficientPeriod { .. }
        | ExportError::SeriesNotAcquired(_) => FailureType::InputCorrectable,
        ExportError::MissingUnitData { .. } => FailureType::UpstreamConfiguration,
        ExportError::Io { .. }
        | ExportError::Storage(_)
        | ExportError::Csv(_)
        | ExportError::Config(_) => FailureType::Environment,
    }
}

// ---------------------------------------------------------------------------
// Logger Setup
// ---------------------------------------------------------------------------

/// Installs the global subscriber.
///
/// `RUST_LOG`, when set, overrides `min_level`. Console output goes to
/// stderr so that stdout stays clean for hand-off JSON.
pub fn init_logger(
    min_level: LogLevel,
    log_file: Option<&Path>,
    console_timestamps: bool,
) -> Result<(), ExportError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(min_level.directive()));

    let (timed, untimed) = if console_timestamps {
        (Some(tfmt::layer().with_target(false).with_writer(std::io::stderr)), None)
    } else {
        (None, Some(tfmt::layer().with_target(false).without_time().with_writer(std::io::stderr)))
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ExportError::io(path, e))?;
            Some(tfmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(timed)
        .with(untimed)
        .with(file_layer)
        .try_init()
        .map_err(|e| ExportError::Config(format!("logger already initialised: {}", e)))
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

pub fn info(stage: Stage, subject: Option<&str>, message: &str) {
    tracing::info!(stage = %stage, subject = subject.unwrap_or("-"), "{}", message);
}

pub fn warn(stage: Stage, subject: Option<&str>, message: &str) {
    tracing::warn!(stage = %stage, subject = subject.unwrap_or("-"), "{}", message);
}

pub fn error(stage: Stage, subject: Option<&str>, message: &str) {
    tracing::error!(stage = %stage, subject = subject.unwrap_or("-"), "{}", message);
}

pub fn debug(stage: Stage, subject: Option<&str>, message: &str) {
    tracing::debug!(stage = %stage, subject = subject.unwrap_or("-"), "{}", message);
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Logs a stage failure at a level chosen by its classification.
pub fn log_failure(stage: Stage, subject: Option<&str>, operation: &str, err: &ExportError) {
    let failure_type = classify_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::InputCorrectable => warn(stage, subject, &message),
        FailureType::UpstreamConfiguration | FailureType::Environment => {
            error(stage, subject, &message)
        }
    }
}

/// One-line summary after both files are written.
pub fn log_export_summary(project_id: &str, natural_rows: usize, altered_rows: usize) {
    info(
        Stage::Export,
        Some(project_id),
        &format!(
            "export complete: {} natural rows, {} altered rows",
            natural_rows, altered_rows
        ),
    );
}
