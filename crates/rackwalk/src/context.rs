use std::collections::HashSet;

use crate::{HandlePool, ObjectId};

/// Default bound on nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Mutable state scoped to a single extraction.
///
/// Built fresh for every extraction and dropped afterwards, so nothing
/// leaks between runs.
#[derive(Debug)]
pub struct ExtractionContext {
    visited: HashSet<ObjectId>,
    handles: HandlePool,
    max_depth: usize,
    pub(crate) skipped_parameters: usize,
    pub(crate) node_errors: usize,
}

impl ExtractionContext {
    pub fn new(max_depth: usize) -> Self {
        Self {
            visited: HashSet::new(),
            handles: HandlePool::new(),
            max_depth,
            skipped_parameters: 0,
            node_errors: 0,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn handles(&self) -> &HandlePool {
        &self.handles
    }

    /// Record a visit. Returns false if `id` was already seen.
    pub fn mark_visited(&mut self, id: ObjectId) -> bool {
        self.visited.insert(id)
    }

    /// Parameters dropped for corruption or read failures.
    pub fn skipped_parameters(&self) -> usize {
        self.skipped_parameters
    }

    /// Children replaced by error markers.
    pub fn node_errors(&self) -> usize {
        self.node_errors
    }
}

impl Default for ExtractionContext {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}
