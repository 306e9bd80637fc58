use core::cell::{RefCell, RefMut};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// A wrapper around [`parking_lot::ReentrantMutex`] guarding mutable state.
///
/// The owning thread may lock again while already holding a guard.
/// Mutable access is handed out through [`ReentrantGuard::borrow_mut`],
/// and such a borrow must not be held across a nested `lock()` that
/// borrows again.
#[derive(Debug)]
pub(crate) struct ReentrantLock<T> {
    inner: ReentrantMutex<RefCell<T>>,
}

impl<T> ReentrantLock<T> {
    /// Creates a new lock in an unlocked state ready for use.
    pub(crate) fn new(data: T) -> Self {
        Self {
            inner: ReentrantMutex::new(RefCell::new(data)),
        }
    }

    /// Acquires the lock, blocking the current thread until it is able to do so.
    ///
    /// Succeeds immediately if the current thread already holds it.
    #[inline]
    pub(crate) fn lock(&self) -> ReentrantGuard<'_, T> {
        ReentrantGuard {
            inner: self.inner.lock(),
        }
    }

    /// Locks, runs `f` against the state, and unlocks.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let guard = self.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }
}

pub(crate) struct ReentrantGuard<'a, T> {
    inner: ReentrantMutexGuard<'a, RefCell<T>>,
}

impl<T> ReentrantGuard<'_, T> {
    #[inline]
    pub(crate) fn borrow_mut(&self) -> RefMut<'_, T> {
        self.inner.borrow_mut()
    }
}
