/// IAHRIS export.
///
/// Submodules:
/// - `format`     : header synthesis, date layout, year-boundary padding.
/// - `coordinator`: runs a natural/altered pair through the whole pipeline
///   and writes both files.

pub mod coordinator;
pub mod format;

pub use coordinator::{ExportCoordinator, ExportHandoff};
pub use format::{ExportDocument, altered_document, natural_document};
