/// Bridge configuration.
///
/// Read from `iahris_bridge.toml` (or the file named by
/// `IAHRIS_BRIDGE_CONFIG`). A `.env` file is honoured for both variables,
/// and `IAHRIS_WORK_DIR` overrides the export directory. A missing config
/// file means defaults; a malformed one is an error.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::logging::LogLevel;
use crate::model::{ExportError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "iahris_bridge.toml";
pub const CONFIG_PATH_ENV: &str = "IAHRIS_BRIDGE_CONFIG";
pub const WORK_DIR_ENV: &str = "IAHRIS_WORK_DIR";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Where export files are written. Created on first export.
    pub work_dir: PathBuf,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Optional append-only log file.
    pub file: Option<PathBuf>,
    pub console_timestamps: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("./temp"),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
            console_timestamps: false,
        }
    }
}

impl BridgeConfig {
    /// Applies `IAHRIS_WORK_DIR`-style overrides. Empty values are ignored.
    pub fn with_work_dir_override(mut self, work_dir: Option<String>) -> Self {
        if let Some(dir) = work_dir.filter(|d| !d.trim().is_empty()) {
            self.work_dir = PathBuf::from(dir);
        }
        self
    }
}

pub fn parse_config(text: &str) -> Result<BridgeConfig> {
    toml::from_str(text).map_err(|e| ExportError::Config(e.to_string()))
}

/// Loads a config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<BridgeConfig> {
    if !path.exists() {
        return Ok(BridgeConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
    parse_config(&text).map_err(|e| match e {
        ExportError::Config(msg) => ExportError::Config(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// `.env`, then the config file, then environment overrides.
pub fn load_from_env() -> Result<BridgeConfig> {
    dotenv::dotenv().ok();

    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(Path::new(&path))?;
    Ok(config.with_work_dir_override(std::env::var(WORK_DIR_ENV).ok()))
}
