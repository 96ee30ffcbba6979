//! Configuration loading for rackwalk.
//!
//! # Usage
//!
//! ```rust,no_run
//! use rackconf::RackConfig;
//!
//! let config = RackConfig::load().expect("Failed to load config");
//! println!("max depth: {}", config.extraction.max_depth);
//! println!("exports go to {}", config.export.dir.display());
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins, key by key):
//! 1. `/etc/rackwalk/config.toml` (system)
//! 2. `~/.config/rackwalk/config.toml` (user)
//! 3. `./rackwalk.toml` (local override), or the path given with `--config`
//! 4. Environment variables (`RACKWALK_*`)
//!
//! # Example Config
//!
//! ```toml
//! [extraction]
//! max_depth = 10
//! extractor_version = "2.0"
//!
//! [export]
//! dir = "~/racks"
//! pretty = true
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod loader;
pub mod settings;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use settings::{ExportConfig, ExtractionConfig, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key} in {path}: {message}")]
    Invalid {
        path: PathBuf,
        key: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RackConfig {
    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl RackConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/rackwalk/config.toml`
    /// 3. `~/.config/rackwalk/config.toml`
    /// 4. `./rackwalk.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with `config_path` in place of `./rackwalk.toml`.
    /// System and user configs still load first.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = RackConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::apply_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# rackwalk configuration\n\n");

        output.push_str("[extraction]\n");
        output.push_str(&format!("max_depth = {}\n", self.extraction.max_depth));
        output.push_str(&format!(
            "extractor_version = \"{}\"\n",
            self.extraction.extractor_version
        ));

        output.push_str("\n[export]\n");
        output.push_str(&format!("dir = \"{}\"\n", self.export.dir.display()));
        output.push_str(&format!("pretty = {}\n", self.export.pretty));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output
    }
}
