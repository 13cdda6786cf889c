/// Immutable request objects handed to the pipeline.
///
/// A caller (CLI or any other front end) decides once which source each side
/// of the comparison comes from and packs that decision here; no stage ever
/// looks back at interactive state.

use std::path::PathBuf;

use crate::model::{AnalysisPeriod, SeriesRole};

/// Where a flow series is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesOrigin {
    /// Daily channel output of a SWAT+ scenario.
    ModelOutput {
        /// The SWAT+ project's `Scenarios` folder.
        scenarios_dir: PathBuf,
        /// Scenario sub-folder name, e.g. `Default`.
        scenario: String,
        /// Channel unit identifier as stored in `channel_sd_day.unit`.
        unit: String,
    },
    /// A `Date,Flow` CSV file.
    FlatFile { path: PathBuf },
}

/// Everything needed to acquire one side of the comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub role: SeriesRole,
    pub origin: SeriesOrigin,
    /// Restricts the series to these years. `None` means all available years.
    pub period: Option<AnalysisPeriod>,
    /// Overrides the default label (scenario name or file stem).
    pub label: Option<String>,
}

impl SeriesRequest {
    pub fn model_output(
        role: SeriesRole,
        scenarios_dir: impl Into<PathBuf>,
        scenario: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            role,
            origin: SeriesOrigin::ModelOutput {
                scenarios_dir: scenarios_dir.into(),
                scenario: scenario.into(),
                unit: unit.into(),
            },
            period: None,
            label: None,
        }
    }

    pub fn flat_file(role: SeriesRole, path: impl Into<PathBuf>) -> Self {
        Self {
            role,
            origin: SeriesOrigin::FlatFile { path: path.into() },
            period: None,
            label: None,
        }
    }

    pub fn with_period(mut self, period: AnalysisPeriod) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A natural/altered pair to export together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub natural: SeriesRequest,
    pub altered: SeriesRequest,
}

impl ExportRequest {
    /// Pairs two requests, forcing each into its slot's role.
    pub fn new(natural: SeriesRequest, altered: SeriesRequest) -> Self {
        Self {
            natural: SeriesRequest { role: SeriesRole::Natural, ..natural },
            altered: SeriesRequest { role: SeriesRole::Altered, ..altered },
        }
    }
}
