//! One export run: acquire → validate → reconcile → format → write.
//!
//! The coordinator keeps the last accepted natural and altered series. A
//! failed acquisition leaves the previously accepted series for that side in
//! place, and a period rejection leaves both, so the caller can fix one input
//! and try again without re-reading the other.
//!
//! Files are written last, after both documents exist in memory. If the
//! second write fails the first file is removed again.

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::analysis::period::{self, ReconciledPair};
use crate::export::format::{self, ExportDocument};
use crate::ingest;
use crate::logging::{self, Stage};
use crate::model::{AnalysisPeriod, ExportError, FlowSeries, PeriodShortfall, Result, SeriesRole};
use crate::request::{ExportRequest, SeriesRequest};
use crate::validate;

/// Project identifier layout handed to IAHRIS, e.g. `2025-05-14_09-30`.
pub const PROJECT_ID_FORMAT: &str = "%Y-%m-%d_%H-%M";

/// What the downstream IAHRIS invocation needs, and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportHandoff {
    pub natural_path: PathBuf,
    pub altered_path: PathBuf,
    /// Truncated to 12 characters, exactly as written in the headers.
    pub natural_label: String,
    pub altered_label: String,
    pub project_id: String,
    pub natural_period: AnalysisPeriod,
    pub altered_period: AnalysisPeriod,
}

#[derive(Debug)]
pub struct ExportCoordinator {
    work_dir: PathBuf,
    natural: Option<FlowSeries>,
    altered: Option<FlowSeries>,
}

impl ExportCoordinator {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self { work_dir: work_dir.into(), natural: None, altered: None }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn natural(&self) -> Option<&FlowSeries> {
        self.natural.as_ref()
    }

    pub fn altered(&self) -> Option<&FlowSeries> {
        self.altered.as_ref()
    }

    /// Reads and validates one side. The slot for `request.role` is replaced
    /// only on success.
    pub fn acquire(&mut self, request: &SeriesRequest) -> Result<&FlowSeries> {
        let series = acquire_series(request)?;

        logging::info(
            Stage::Validate,
            Some(series.label()),
            &format!(
                "accepted {} series: {} days, {} to {}",
                series.role(),
                series.len(),
                series.first_date(),
                series.last_date()
            ),
        );

        let slot = match request.role {
            SeriesRole::Natural => &mut self.natural,
            SeriesRole::Altered => &mut self.altered,
        };
        Ok(slot.insert(series))
    }

    /// Full run from a paired request: acquire both sides, then export.
    pub fn run(&mut self, request: &ExportRequest) -> Result<ExportHandoff> {
        self.acquire(&request.natural)?;
        self.acquire(&request.altered)?;
        self.export(None, None)
    }

    /// Exports the held series, optionally narrowed to new periods.
    pub fn export(
        &self,
        natural_period: Option<AnalysisPeriod>,
        altered_period: Option<AnalysisPeriod>,
    ) -> Result<ExportHandoff> {
        self.export_at(natural_period, altered_period, Local::now().naive_local())
    }

    /// `export` with an explicit clock for the project identifier.
    pub fn export_at(
        &self,
        natural_period: Option<AnalysisPeriod>,
        altered_period: Option<AnalysisPeriod>,
        now: NaiveDateTime,
    ) -> Result<ExportHandoff> {
        let natural = self.natural.as_ref().ok_or(ExportError::SeriesNotAcquired(SeriesRole::Natural))?;
        let altered = self.altered.as_ref().ok_or(ExportError::SeriesNotAcquired(SeriesRole::Altered))?;

        let pair = period::reconcile(natural, altered, natural_period, altered_period)
            .inspect_err(|e| logging::log_failure(Stage::Period, None, "period check", e))?;

        let ReconciledPair { natural, altered } = &pair;
        let natural_doc = format::natural_document(natural);
        let altered_doc = format::altered_document(altered, natural.label());

        let natural_path = self.work_dir.join(format::export_file_name(natural.label(), SeriesRole::Natural));
        let altered_path = self.work_dir.join(format::export_file_name(altered.label(), SeriesRole::Altered));

        write_pair(&self.work_dir, (&natural_doc, &natural_path), (&altered_doc, &altered_path))
            .inspect_err(|e| logging::log_failure(Stage::Export, None, "writing export files", e))?;

        let project_id = now.format(PROJECT_ID_FORMAT).to_string();
        logging::log_export_summary(&project_id, natural_doc.rows().len(), altered_doc.rows().len());

        Ok(ExportHandoff {
            natural_path,
            altered_path,
            natural_label: natural.short_label(),
            altered_label: altered.short_label(),
            project_id,
            natural_period: pair.natural_period(),
            altered_period: pair.altered_period(),
        })
    }
}

/// Acquire + validate without touching any coordinator state.
///
/// The requested years are applied to the validated series, so a defect
/// outside them still rejects the source.
pub fn acquire_series(request: &SeriesRequest) -> Result<FlowSeries> {
    let subject = request.label.as_deref();

    let raw = ingest::acquire(request)
        .inspect_err(|e| logging::log_failure(Stage::System, subject, "acquisition", e))?;

    let label = raw.label.clone();
    let series = validate::validate_series(raw)
        .inspect_err(|e| logging::log_failure(Stage::Validate, Some(&label), "validation", e))?;

    let Some(period) = request.period else {
        return Ok(series);
    };
    series
        .within(period)
        .ok_or_else(|| ExportError::InsufficientPeriod {
            shortfalls: vec![PeriodShortfall { role: request.role, period, empty: true }],
        })
        .inspect_err(|e| logging::log_failure(Stage::Period, Some(&label), "year selection", e))
}

fn write_pair(
    work_dir: &Path,
    natural: (&ExportDocument, &Path),
    altered: (&ExportDocument, &Path),
) -> Result<()> {
    std::fs::create_dir_all(work_dir).map_err(|e| ExportError::io(work_dir, e))?;

    natural.0.write_to(natural.1)?;
    if let Err(e) = altered.0.write_to(altered.1) {
        if let Err(cleanup) = std::fs::remove_file(natural.1) {
            logging::warn(
                Stage::Export,
                None,
                &format!("could not remove {}: {}", natural.1.display(), cleanup),
            );
        }
        return Err(e);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
