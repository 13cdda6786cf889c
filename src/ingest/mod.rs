/// Flow series acquisition.
///
/// Submodules:
/// - `swat`     : SWAT+ results store: scenario discovery and `channel_sd_day` queries.
/// - `flat_file`: `Date,Flow` CSV files.
///
/// Both produce an unvalidated `RawSeries`; `acquire` dispatches on the
/// request's origin once and hands back whatever the source produced. The
/// SWAT+ query is bounded by the requested years; a flat file is always read
/// whole and narrowed only after it has been validated.

pub mod flat_file;
pub mod swat;

use crate::logging::{self, Stage};
use crate::model::{RawSeries, Result};
use crate::request::{SeriesOrigin, SeriesRequest};

/// Reads the raw candidate series described by `request`.
pub fn acquire(request: &SeriesRequest) -> Result<RawSeries> {
    let mut raw = match &request.origin {
        SeriesOrigin::ModelOutput { scenarios_dir, scenario, unit } => {
            let store = swat::ScenarioStore::open(scenarios_dir)
                .map_err(|e| swat::attach_role(e, request.role))?;
            store.fetch_series(request.role, scenario, unit, request.period)?
        }
        SeriesOrigin::FlatFile { path } => {
            flat_file::read_series(path, request.role)?
        }
    };

    if let Some(label) = &request.label {
        raw.label = label.clone();
    }

    logging::debug(
        Stage::for_origin(raw.origin),
        Some(&raw.label),
        &format!("read {} {} records", raw.records.len(), request.role),
    );

    Ok(raw)
}
