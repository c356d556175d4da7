//! Configuration loading and config file resolution
//!
//! Config file location priority:
//! 1. Command-line argument (highest priority)
//! 2. `SCINV_CONFIG` environment variable
//! 3. User config file (`~/.config/scinv/config.toml` on Linux)
//! 4. System config file (`/etc/scinv/config.toml`, Unix only)
//! 5. Built-in defaults (fallback)
//!
//! A missing config file never stops a tool from starting; a file that exists
//! but cannot be parsed does.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SCINV_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Tabular export settings (optional)
    #[serde(default)]
    pub export: ExportConfig,

    /// Editor settings (optional)
    #[serde(default)]
    pub edit: EditConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Tabular export configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Directory receiving the exported table
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name of the exported table inside `output_dir`
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Resolve streams on the rayon thread pool
    #[serde(default)]
    pub parallel: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_name: default_file_name(),
            delimiter: default_delimiter(),
            parallel: false,
        }
    }
}

/// Editor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EditConfig {
    /// Suffix replacing the document's extension for the pre-save backup
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            backup_suffix: default_backup_suffix(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_file_name() -> String {
    "unified_inventory_analysis.csv".to_string()
}

fn default_delimiter() -> char {
    ','
}

fn default_backup_suffix() -> String {
    ".xml.bak".to_string()
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    UserFile(PathBuf),
    SystemFile(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::CommandLine(p) => write!(f, "{} (command line)", p.display()),
            ConfigSource::Environment(p) => write!(f, "{} (${CONFIG_ENV_VAR})", p.display()),
            ConfigSource::UserFile(p) => write!(f, "{} (user config)", p.display()),
            ConfigSource::SystemFile(p) => write!(f, "{} (system config)", p.display()),
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

impl TomlConfig {
    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Resolve and load the configuration
    ///
    /// A `--config` path or `SCINV_CONFIG` naming a missing file is skipped
    /// with a warning; resolution continues with the next location.
    pub fn load(cli_arg: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let source = resolve_config_source(cli_arg);
        let config = match &source {
            ConfigSource::CommandLine(p)
            | ConfigSource::Environment(p)
            | ConfigSource::UserFile(p)
            | ConfigSource::SystemFile(p) => Self::from_file(p)?,
            ConfigSource::Defaults => Self::default(),
        };
        Ok((config, source))
    }
}

/// Determine which config file (if any) applies
pub fn resolve_config_source(cli_arg: Option<&Path>) -> ConfigSource {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        if path.exists() {
            return ConfigSource::CommandLine(path.to_path_buf());
        }
        warn!("Config file {} not found, ignoring --config", path.display());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        if path.exists() {
            return ConfigSource::Environment(path);
        }
        warn!("{} points to missing file {}, ignoring it", CONFIG_ENV_VAR, path.display());
    }

    // Priority 3: User config file
    if let Some(path) = user_config_path() {
        if path.exists() {
            return ConfigSource::UserFile(path);
        }
    }

    // Priority 4: System config file
    if cfg!(unix) {
        let path = PathBuf::from("/etc/scinv/config.toml");
        if path.exists() {
            return ConfigSource::SystemFile(path);
        }
    }

    ConfigSource::Defaults
}

/// Platform user config path (`<config dir>/scinv/config.toml`)
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("scinv").join("config.toml"))
}
