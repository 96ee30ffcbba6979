use std::path::PathBuf;

use thiserror::Error;

use crate::AccessorError;

/// Errors that abort an extraction. Everything below the root is recovered
/// inline and never shows up here.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot resolve root device at {path}: {reason}")]
    RootUnresolvable { path: String, reason: String },

    #[error(transparent)]
    Accessor(#[from] AccessorError),

    #[error("failed to serialize workflow: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write export {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
