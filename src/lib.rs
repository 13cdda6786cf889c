/// iahris_bridge: hands SWAT+ and CSV daily flow series to IAHRIS.
///
/// # Module structure
///
/// ```text
/// iahris_bridge
/// ├── model       shared data types (FlowSeries, AnalysisPeriod, ExportError, …)
/// ├── request     what the user picked for each side of the comparison
/// ├── ingest
/// │   ├── swat      SWAT+ results store: scenarios, channel units, daily flow
/// │   └── flat_file `Date`/`Flow` CSV series
/// ├── validate    strict daily frequency and discharge checks
/// ├── analysis
/// │   └── period  minimum-span check and period narrowing for the pair
/// ├── export
/// │   ├── format      IAHRIS `;`-separated document layout
/// │   └── coordinator acquire → validate → reconcile → write, plus hand-off
/// ├── config      TOML + environment configuration
/// └── logging     tracing setup and stage-tagged events
/// ```

pub mod analysis;
pub mod config;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod request;
pub mod validate;
