//! Command-line surface of `iahris-bridge`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use iahris_bridge::model::{AnalysisPeriod, SeriesRole};
use iahris_bridge::request::{ExportRequest, SeriesRequest};

use crate::error::CliError;

#[derive(Debug, Parser)]
#[command(name = "iahris-bridge", version, about = "Prepare SWAT+ or CSV daily flow series for IAHRIS")]
pub struct Cli {
    /// Log at debug level regardless of configuration.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the scenarios of a SWAT+ `Scenarios` folder.
    Scenarios {
        scenarios_dir: PathBuf,
    },
    /// Show the channel units and simulated years of one scenario.
    Channels {
        scenarios_dir: PathBuf,
        scenario: String,
    },
    /// Write the natural/altered pair and print the hand-off as JSON.
    Export(ExportArgs),
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Natural series from a `Date,Flow` CSV file.
    #[arg(long, value_name = "PATH")]
    pub nat_csv: Option<PathBuf>,
    /// Natural series from a SWAT+ `Scenarios` folder.
    #[arg(long, value_name = "SCENARIOS_DIR")]
    pub nat_swat: Option<PathBuf>,
    #[arg(long, value_name = "SCENARIO")]
    pub nat_scenario: Option<String>,
    #[arg(long, value_name = "UNIT")]
    pub nat_unit: Option<String>,
    #[arg(long, value_name = "YEAR")]
    pub nat_start: Option<i32>,
    #[arg(long, value_name = "YEAR")]
    pub nat_end: Option<i32>,
    #[arg(long, value_name = "LABEL")]
    pub nat_label: Option<String>,

    /// Altered series from a `Date,Flow` CSV file.
    #[arg(long, value_name = "PATH")]
    pub alt_csv: Option<PathBuf>,
    /// Altered series from a SWAT+ `Scenarios` folder.
    #[arg(long, value_name = "SCENARIOS_DIR")]
    pub alt_swat: Option<PathBuf>,
    #[arg(long, value_name = "SCENARIO")]
    pub alt_scenario: Option<String>,
    #[arg(long, value_name = "UNIT")]
    pub alt_unit: Option<String>,
    #[arg(long, value_name = "YEAR")]
    pub alt_start: Option<i32>,
    #[arg(long, value_name = "YEAR")]
    pub alt_end: Option<i32>,
    #[arg(long, value_name = "LABEL")]
    pub alt_label: Option<String>,

    /// Export directory. Overrides the configured `work_dir`.
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,
}

/// The flags of one side, before they are checked.
struct SideArgs<'a> {
    role: SeriesRole,
    csv: &'a Option<PathBuf>,
    swat: &'a Option<PathBuf>,
    scenario: &'a Option<String>,
    unit: &'a Option<String>,
    start: Option<i32>,
    end: Option<i32>,
    label: &'a Option<String>,
}

impl ExportArgs {
    pub fn to_request(&self) -> Result<ExportRequest, CliError> {
        let natural = SideArgs {
            role: SeriesRole::Natural,
            csv: &self.nat_csv,
            swat: &self.nat_swat,
            scenario: &self.nat_scenario,
            unit: &self.nat_unit,
            start: self.nat_start,
            end: self.nat_end,
            label: &self.nat_label,
        };
        let altered = SideArgs {
            role: SeriesRole::Altered,
            csv: &self.alt_csv,
            swat: &self.alt_swat,
            scenario: &self.alt_scenario,
            unit: &self.alt_unit,
            start: self.alt_start,
            end: self.alt_end,
            label: &self.alt_label,
        };
        Ok(ExportRequest::new(natural.into_request()?, altered.into_request()?))
    }
}

impl SideArgs<'_> {
    fn prefix(&self) -> &'static str {
        self.role.file_suffix()
    }

    fn into_request(self) -> Result<SeriesRequest, CliError> {
        let p = self.prefix();
        let mut request = match (self.csv, self.swat) {
            (Some(path), None) => SeriesRequest::flat_file(self.role, path),
            (None, Some(dir)) => {
                let scenario = self.scenario.as_ref().ok_or_else(|| {
                    CliError::Usage(format!("--{p}-swat needs --{p}-scenario"))
                })?;
                let unit = self
                    .unit
                    .as_ref()
                    .ok_or_else(|| CliError::Usage(format!("--{p}-swat needs --{p}-unit")))?;
                SeriesRequest::model_output(self.role, dir, scenario, unit)
            }
            (Some(_), Some(_)) => {
                return Err(CliError::Usage(format!("use either --{p}-csv or --{p}-swat, not both")));
            }
            (None, None) => {
                return Err(CliError::Usage(format!("the {} series needs --{p}-csv or --{p}-swat", self.role)));
            }
        };

        match (self.start, self.end) {
            (Some(start), Some(end)) if start <= end => {
                request = request.with_period(AnalysisPeriod::new(start, end));
            }
            (Some(start), Some(end)) => {
                return Err(CliError::Usage(format!("--{p}-start {start} is after --{p}-end {end}")));
            }
            (None, None) => {}
            _ => {
                return Err(CliError::Usage(format!("--{p}-start and --{p}-end go together")));
            }
        }

        if let Some(label) = self.label {
            request = request.with_label(label.clone());
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iahris_bridge::request::SeriesOrigin;

    fn export_args(args: &[&str]) -> ExportArgs {
        let mut argv = vec!["iahris-bridge", "export"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Export(args) => args,
            other => panic!("expected export, got {:?}", other),
        }
    }

    #[test]
    fn test_mixed_sources_build_request() {
        let args = export_args(&[
            "--nat-swat", "/proj/Scenarios", "--nat-scenario", "Default", "--nat-unit", "5",
            "--nat-start", "2000", "--nat-end", "2020",
            "--alt-csv", "dam.csv", "--alt-label", "Dam",
        ]);
        let request = args.to_request().unwrap();

        assert_eq!(request.natural.period, Some(AnalysisPeriod::new(2000, 2020)));
        assert!(matches!(
            request.natural.origin,
            SeriesOrigin::ModelOutput { ref scenario, ref unit, .. } if scenario == "Default" && unit == "5"
        ));
        assert_eq!(request.altered.origin, SeriesOrigin::FlatFile { path: "dam.csv".into() });
        assert_eq!(request.altered.label.as_deref(), Some("Dam"));
        assert_eq!(request.altered.period, None);
    }

    #[test]
    fn test_both_sources_for_one_side_is_rejected() {
        let args = export_args(&["--nat-csv", "a.csv", "--nat-swat", "/p/Scenarios", "--alt-csv", "b.csv"]);
        let err = args.to_request().unwrap_err();
        assert!(err.to_string().contains("--nat-csv"), "{}", err);
    }

    #[test]
    fn test_missing_side_is_rejected() {
        let args = export_args(&["--nat-csv", "a.csv"]);
        let err = args.to_request().unwrap_err();
        assert!(err.to_string().contains("altered"), "{}", err);
    }

    #[test]
    fn test_swat_source_needs_unit() {
        let args = export_args(&["--nat-swat", "/p/Scenarios", "--nat-scenario", "Default", "--alt-csv", "b.csv"]);
        let err = args.to_request().unwrap_err();
        assert!(err.to_string().contains("--nat-unit"), "{}", err);
    }

    #[test]
    fn test_half_period_is_rejected() {
        let args = export_args(&["--nat-csv", "a.csv", "--alt-csv", "b.csv", "--alt-start", "2000"]);
        assert!(matches!(args.to_request(), Err(CliError::Usage(_))));
    }
}
