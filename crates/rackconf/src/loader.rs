//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, RackConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variables consulted by [`apply_env_overrides`].
pub const ENV_MAX_DEPTH: &str = "RACKWALK_MAX_DEPTH";
pub const ENV_EXTRACTOR_VERSION: &str = "RACKWALK_EXTRACTOR_VERSION";
pub const ENV_EXPORT_DIR: &str = "RACKWALK_EXPORT_DIR";
pub const ENV_LOG_LEVEL: &str = "RACKWALK_LOG_LEVEL";

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in load order (system, user, local).
///
/// Only existing files are returned, except `cli_path`: it replaces the local
/// override and is returned even if missing so that loading reports the bad
/// path.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/rackwalk/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("rackwalk/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(path.to_path_buf());
        return files;
    }

    let local = PathBuf::from("rackwalk.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Overlay the keys present in `path` onto `config`.
pub fn apply_file(config: &mut RackConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

/// Overlay the keys present in a TOML document onto `config`. Keys that are
/// absent keep their current value, so later files only override what they
/// mention.
pub fn apply_toml(config: &mut RackConfig, contents: &str, path: &Path) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let invalid = |key: &str, message: &str| ConfigError::Invalid {
        path: path.to_path_buf(),
        key: key.to_string(),
        message: message.to_string(),
    };
    let string = |v: &toml::Value, key: &str| {
        v.as_str()
            .map(str::to_string)
            .ok_or_else(|| invalid(key, "expected a string"))
    };

    if let Some(extraction) = table.get("extraction").and_then(|v| v.as_table()) {
        if let Some(v) = extraction.get("max_depth") {
            let depth = v
                .as_integer()
                .ok_or_else(|| invalid("extraction.max_depth", "expected an integer"))?;
            config.extraction.max_depth = usize::try_from(depth)
                .map_err(|_| invalid("extraction.max_depth", "must not be negative"))?;
        }
        if let Some(v) = extraction.get("extractor_version") {
            config.extraction.extractor_version = string(v, "extraction.extractor_version")?;
        }
    }

    if let Some(export) = table.get("export").and_then(|v| v.as_table()) {
        if let Some(v) = export.get("dir") {
            config.export.dir = expand_path(&string(v, "export.dir")?);
        }
        if let Some(v) = export.get("pretty") {
            config.export.pretty = v
                .as_bool()
                .ok_or_else(|| invalid("export.pretty", "expected a boolean"))?;
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level") {
            config.telemetry.log_level = string(v, "telemetry.log_level")?;
        }
    }

    Ok(())
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut RackConfig, sources: &mut ConfigSources) {
    apply_env_overrides_with(config, sources, |key| env::var(key).ok());
}

/// Apply overrides from an arbitrary variable lookup.
pub fn apply_env_overrides_with<F>(config: &mut RackConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup(ENV_MAX_DEPTH) {
        if let Ok(depth) = v.parse() {
            config.extraction.max_depth = depth;
            sources.env_overrides.push(ENV_MAX_DEPTH.to_string());
        }
    }
    if let Some(v) = lookup(ENV_EXTRACTOR_VERSION) {
        config.extraction.extractor_version = v;
        sources.env_overrides.push(ENV_EXTRACTOR_VERSION.to_string());
    }
    if let Some(v) = lookup(ENV_EXPORT_DIR) {
        config.export.dir = expand_path(&v);
        sources.env_overrides.push(ENV_EXPORT_DIR.to_string());
    }
    if let Some(v) = lookup(ENV_LOG_LEVEL) {
        config.telemetry.log_level = v;
        sources.env_overrides.push(ENV_LOG_LEVEL.to_string());
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(stripped);
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // Handle $VAR/rest/of/path
        let (var_name, rest) = match stripped.find('/') {
            Some(slash_pos) => (&stripped[..slash_pos], Some(&stripped[slash_pos + 1..])),
            None => (stripped, None),
        };
        if let Ok(var_value) = env::var(var_name) {
            let base = PathBuf::from(var_value);
            return match rest {
                Some(rest) => base.join(rest),
                None => base,
            };
        }
    }

    PathBuf::from(path)
}
