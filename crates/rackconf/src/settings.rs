//! Configuration sections.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How extractions walk the device tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Deepest nesting level walked before a depth marker is emitted.
    /// Default: 10
    #[serde(default = "ExtractionConfig::default_max_depth")]
    pub max_depth: usize,

    /// Stamped into every document's metadata.
    /// Default: "2.0"
    #[serde(default = "ExtractionConfig::default_extractor_version")]
    pub extractor_version: String,
}

impl ExtractionConfig {
    fn default_max_depth() -> usize {
        10
    }

    fn default_extractor_version() -> String {
        "2.0".to_string()
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::default_max_depth(),
            extractor_version: Self::default_extractor_version(),
        }
    }
}

/// Where and how exports are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory for timestamped exports when no explicit path is given.
    /// Default: current directory
    #[serde(default = "ExportConfig::default_dir")]
    pub dir: PathBuf,

    /// Pretty-print JSON.
    /// Default: true
    #[serde(default = "ExportConfig::default_pretty")]
    pub pretty: bool,
}

impl ExportConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from(".")
    }

    fn default_pretty() -> bool {
        true
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
            pretty: Self::default_pretty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default `tracing` filter directive.
    /// Default: "info"
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
