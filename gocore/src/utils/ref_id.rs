use std::{ops::Deref, sync::Arc};

/// Identity key over an [`Arc`].
///
/// Two keys are equal only if they point to the same allocation, regardless of
/// the pointee's contents. Used to track functions and record types by identity.
#[derive(Debug)]
pub struct ArcId<T> {
    inner: Arc<T>,
}

impl<T> ArcId<T> {
    pub fn new(inner: &Arc<T>) -> Self {
        Self {
            inner: Arc::clone(inner),
        }
    }

    pub fn borrow_arc(&self) -> &Arc<T> {
        &self.inner
    }

    fn addr(&self) -> *const T {
        Arc::as_ptr(&self.inner)
    }
}

impl<T> Clone for ArcId<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Deref for ArcId<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> PartialEq for ArcId<T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }
}

impl<T> Eq for ArcId<T> {}

impl<T> PartialOrd for ArcId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for ArcId<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.addr().cmp(&other.addr())
    }
}

impl<T> std::hash::Hash for ArcId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}
