//! The live object accessor the walker reads through.
//!
//! Implementations can front a real host session or an in-memory
//! [`crate::SnapshotAccessor`]. The walker only ever talks to this trait.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ContainerKind, LomPath, LomValue};

/// Opaque identity of a live object. Stable for the lifetime of a session,
/// independent of which path was used to reach the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id {}", self.0)
    }
}

/// Result of resolving a path. `exists == false` means nothing lives there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub id: ObjectId,
    pub exists: bool,
}

/// Child containers an object exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub containers: BTreeSet<ContainerKind>,
}

impl Capabilities {
    pub fn new(containers: impl IntoIterator<Item = ContainerKind>) -> Self {
        Self {
            containers: containers.into_iter().collect(),
        }
    }

    pub fn has(&self, kind: ContainerKind) -> bool {
        self.containers.contains(&kind)
    }

    /// Rack-like objects can hold chains.
    pub fn is_rack(&self) -> bool {
        self.has(ContainerKind::Chains)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AccessorError {
    #[error("live object accessor is unavailable")]
    Unavailable,

    #[error("no live object at {path}")]
    InvalidPath { path: String },

    #[error("failed to read '{property}' at {path}: {message}")]
    Property {
        path: String,
        property: String,
        message: String,
    },

    #[error("failed to count {kind} at {path}: {message}")]
    Count {
        path: String,
        kind: ContainerKind,
        message: String,
    },
}

impl AccessorError {
    /// Fatal errors abort the whole extraction instead of being recorded
    /// inline at the failing node.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    pub fn invalid_path(path: &LomPath) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
        }
    }
}

pub trait LiveAccessor {
    /// Resolve a path to the identity of the object it addresses.
    fn resolve(&self, path: &LomPath) -> Result<Resolved, AccessorError>;

    /// Read a named property. Missing properties come back as `LomValue::Null`.
    fn get_property(&self, path: &LomPath, name: &str) -> Result<LomValue, AccessorError>;

    /// Number of children in one of the object's containers.
    fn child_count(&self, path: &LomPath, kind: ContainerKind) -> Result<usize, AccessorError>;

    /// Containers the object exposes.
    fn capabilities(&self, path: &LomPath) -> Result<Capabilities, AccessorError>;
}

impl<A: LiveAccessor + ?Sized> LiveAccessor for &A {
    fn resolve(&self, path: &LomPath) -> Result<Resolved, AccessorError> {
        (**self).resolve(path)
    }

    fn get_property(&self, path: &LomPath, name: &str) -> Result<LomValue, AccessorError> {
        (**self).get_property(path, name)
    }

    fn child_count(&self, path: &LomPath, kind: ContainerKind) -> Result<usize, AccessorError> {
        (**self).child_count(path, kind)
    }

    fn capabilities(&self, path: &LomPath) -> Result<Capabilities, AccessorError> {
        (**self).capabilities(path)
    }
}
