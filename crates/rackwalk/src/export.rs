//! JSON export of extraction results.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use crate::normalize::scrub;
use crate::{ExtractError, WorkflowDocument};

/// Serialize `document`, dropping anything the host corrupted on the way.
pub fn to_value(document: &WorkflowDocument) -> Result<Value, ExtractError> {
    Ok(scrub(&serde_json::to_value(document)?))
}

pub fn to_json(document: &WorkflowDocument, pretty: bool) -> Result<String, ExtractError> {
    let value = to_value(document)?;
    let json = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(json)
}

/// Default export file name, e.g. `rack_export_1700000000000.json`.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("rack_export_{}.json", now.timestamp_millis())
}

/// Write `document` to `path`. Returns the number of bytes written.
pub fn write_export(
    document: &WorkflowDocument,
    path: &Path,
    pretty: bool,
) -> Result<usize, ExtractError> {
    let json = to_json(document, pretty)?;
    std::fs::write(path, &json).map_err(|e| ExtractError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!(path = %path.display(), bytes = json.len(), "exported workflow");
    Ok(json.len())
}

/// Write `document` into `dir` under a timestamped name.
pub fn write_export_to_dir(
    document: &WorkflowDocument,
    dir: &Path,
    pretty: bool,
) -> Result<PathBuf, ExtractError> {
    let path = dir.join(export_file_name(Utc::now()));
    write_export(document, &path, pretty)?;
    Ok(path)
}

/// Read a previously exported document.
pub fn read_export(path: &Path) -> Result<WorkflowDocument, ExtractError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ExtractError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_json::from_str(&contents)?)
}
