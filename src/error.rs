use thiserror::Error;

use iahris_bridge::logging::{FailureType, classify_failure};
use iahris_bridge::model::ExportError;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("invalid arguments: {0}")]
    Usage(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    /// 2 input to correct, 3 period rule, 4 upstream model setup, 10 I/O.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => 2,
            Self::Serialization(_) => 10,
            Self::Export(ExportError::InsufficientPeriod { .. }) => 3,
            Self::Export(err) => match classify_failure(err) {
                FailureType::InputCorrectable => 2,
                FailureType::UpstreamConfiguration => 4,
                FailureType::Environment => 10,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iahris_bridge::model::{AnalysisPeriod, PeriodShortfall, SeriesRole};

    #[test]
    fn test_exit_codes() {
        let short = ExportError::InsufficientPeriod {
            shortfalls: vec![PeriodShortfall {
                role: SeriesRole::Natural,
                period: AnalysisPeriod::new(2000, 2010),
                empty: false,
            }],
        };
        assert_eq!(CliError::from(short).exit_code(), 3);

        let missing = ExportError::MissingUnitData { role: None, scenario: "Default".into(), unit: None };
        assert_eq!(CliError::from(missing).exit_code(), 4);

        let gap = ExportError::InvalidFrequency { role: SeriesRole::Altered, detail: "gap".into() };
        assert_eq!(CliError::from(gap).exit_code(), 2);

        let io = ExportError::io("/tmp/out", std::io::Error::other("denied"));
        assert_eq!(CliError::from(io).exit_code(), 10);

        assert_eq!(CliError::Usage("x".into()).exit_code(), 2);
    }
}
