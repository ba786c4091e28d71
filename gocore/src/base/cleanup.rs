//! Deferred calls
//!
//! Each call of a wrapped function owns one [`CleanupScope`] on the context's
//! [`CleanupStack`]. Callbacks registered with [`GoContext::defer`] land in the
//! innermost scope and run in reverse registration order when that call ends.
//!
//! [`GoContext::defer`]: crate::base::GoContext::defer
use smallvec::SmallVec;

use crate::{
    base::GoContext,
    utils::error::{GoError, GoResult},
};

/// A deferred callback.
pub type Deferred = Box<dyn FnOnce(&mut GoContext) -> GoResult<()>>;

/// Deferred callbacks of a single call.
#[derive(Default)]
pub struct CleanupScope {
    deferred: SmallVec<Deferred, 4>,
}

impl CleanupScope {
    pub fn push(&mut self, deferred: Deferred) {
        self.deferred.push(deferred);
    }

    /// Takes the most recently registered callback.
    pub fn pop(&mut self) -> Option<Deferred> {
        self.deferred.pop()
    }

    pub fn len(&self) -> usize {
        self.deferred.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deferred.is_empty()
    }
}

/// Stack of cleanup scopes, innermost last.
#[derive(Default)]
pub struct CleanupStack {
    scopes: Vec<CleanupScope>,
}

impl CleanupStack {
    pub fn push_scope(&mut self) {
        self.scopes.push(CleanupScope::default());
    }

    pub fn pop_scope(&mut self) -> Option<CleanupScope> {
        self.scopes.pop()
    }

    /// Registers `deferred` in the innermost scope.
    pub fn defer(&mut self, deferred: Deferred) -> GoResult<()> {
        let scope = self.scopes.last_mut().ok_or(GoError::NoActiveScope)?;
        scope.push(deferred);
        Ok(())
    }

    /// Number of active scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Number of callbacks pending in the innermost scope.
    pub fn pending(&self) -> usize {
        self.scopes.last().map_or(0, CleanupScope::len)
    }
}

impl std::fmt::Debug for CleanupStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.scopes.iter().map(CleanupScope::len))
            .finish()
    }
}
