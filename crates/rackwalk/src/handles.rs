//! Reusable accessor handles, one per recursion level.
//!
//! A handle is a cursor onto a live object: a path buffer plus the identity
//! it resolved to. Each recursion level checks one out for the duration of
//! its subtree; dropping the [`HandleGuard`] invalidates the handle and puts
//! it back, so siblings reuse the same buffers instead of allocating.
//! Guards must be released in LIFO order, which scoped use guarantees.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use crate::{ContainerKind, LomPath, ObjectId};

#[derive(Debug, Default)]
pub struct LiveHandle {
    path: LomPath,
    id: Option<ObjectId>,
}

impl LiveHandle {
    pub fn path(&self) -> &LomPath {
        &self.path
    }

    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    /// Point the handle at `path`, reusing the existing buffer.
    pub fn target(&mut self, path: &LomPath) {
        self.path.clone_from(path);
        self.id = None;
    }

    /// Point the handle at `base <kind> <index>`.
    pub fn target_child(&mut self, base: &LomPath, kind: ContainerKind, index: usize) {
        self.target(base);
        self.path.push(kind, index);
    }

    pub fn bind(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    fn invalidate(&mut self) {
        self.path.clear();
        self.id = None;
    }
}

#[derive(Debug, Default)]
struct PoolState {
    idle: Vec<Option<LiveHandle>>,
    level: usize,
    allocated: usize,
}

/// Arena of handles keyed by recursion level.
#[derive(Debug, Clone, Default)]
pub struct HandlePool {
    state: Rc<RefCell<PoolState>>,
}

impl HandlePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check out the handle for the next recursion level.
    pub fn acquire(&self) -> HandleGuard {
        let mut state = self.state.borrow_mut();
        let level = state.level;

        let handle = match state.idle.get_mut(level).and_then(Option::take) {
            Some(handle) => handle,
            None => {
                state.allocated += 1;
                LiveHandle::default()
            }
        };
        state.level += 1;

        HandleGuard {
            pool: Rc::clone(&self.state),
            level,
            handle: Some(handle),
        }
    }

    /// Handles currently checked out.
    pub fn outstanding(&self) -> usize {
        self.state.borrow().level
    }

    /// Handles ever created. Bounded by the deepest recursion reached,
    /// not by the number of nodes visited.
    pub fn allocated(&self) -> usize {
        self.state.borrow().allocated
    }
}

/// Exclusive use of one pooled handle; returned on drop.
#[derive(Debug)]
pub struct HandleGuard {
    pool: Rc<RefCell<PoolState>>,
    level: usize,
    handle: Option<LiveHandle>,
}

impl Deref for HandleGuard {
    type Target = LiveHandle;

    fn deref(&self) -> &LiveHandle {
        self.handle.as_ref().expect("handle present until drop")
    }
}

impl DerefMut for HandleGuard {
    fn deref_mut(&mut self) -> &mut LiveHandle {
        self.handle.as_mut().expect("handle present until drop")
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };
        handle.invalidate();

        let mut state = self.pool.borrow_mut();
        debug_assert_eq!(state.level, self.level + 1, "handle guards released out of order");
        state.level = self.level;
        if state.idle.len() <= self.level {
            state.idle.resize_with(self.level + 1, || None);
        }
        state.idle[self.level] = Some(handle);
    }
}
