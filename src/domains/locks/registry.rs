//! Per-path lock registry.
//!
//! The registry is an explicit object: construct one at the top of the
//! program and share it (usually behind an `Arc`) with every component that
//! mutates files. Entries are created on first use and never removed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use super::error::LockError;
use crate::core::security::clean_path;

/// Exclusive lock for a single path.
///
/// Unlike `std::sync::Mutex`, locking and unlocking are separate calls that
/// need not happen in the same scope, which is what `lock_file` /
/// `unlock_file` expose. Prefer [`LockRegistry::with_file_lock`] or
/// [`LockRegistry::guard`] where scoped release is possible.
#[derive(Debug, Default)]
pub struct FileMutex {
    locked: Mutex<bool>,
    released: Condvar,
}

impl FileMutex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock is free, then take it.
    pub fn lock(&self) {
        let mut locked = self.state();
        while *locked {
            locked = self
                .released
                .wait(locked)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *locked = true;
    }

    /// Take the lock if it is free. Returns whether it was taken.
    pub fn try_lock(&self) -> bool {
        let mut locked = self.state();
        if *locked {
            return false;
        }
        *locked = true;
        true
    }

    /// Release the lock. Returns `false` if it was not held.
    pub fn unlock(&self) -> bool {
        let mut locked = self.state();
        if !*locked {
            return false;
        }
        *locked = false;
        drop(locked);
        self.released.notify_one();
        true
    }

    pub fn is_locked(&self) -> bool {
        *self.state()
    }

    // The flag is only touched in short critical sections above, so a
    // poisoned guard still holds a consistent value.
    fn state(&self) -> MutexGuard<'_, bool> {
        self.locked.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds a [`FileMutex`] until dropped, including during unwinding.
#[derive(Debug)]
pub struct FileLockGuard {
    mutex: Arc<FileMutex>,
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        self.mutex.unlock();
    }
}

/// Process-local map from cleaned path to its [`FileMutex`].
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<PathBuf, Arc<FileMutex>>>,
}

impl LockRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the mutex for `path`, creating it on first use.
    ///
    /// Concurrent callers asking for the same cleaned path always receive the
    /// same mutex.
    pub fn get_lock(&self, path: impl AsRef<Path>) -> Arc<FileMutex> {
        let key = clean_path(path);
        let mut locks = self.map();
        Arc::clone(locks.entry(key).or_insert_with(|| {
            trace!("Creating file lock");
            Arc::new(FileMutex::new())
        }))
    }

    /// Block until the lock for `path` is acquired.
    pub fn lock_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        debug!("Locking {:?}", path);
        self.get_lock(path).lock();
    }

    /// Acquire the lock for `path` without blocking.
    pub fn try_lock_file(&self, path: impl AsRef<Path>) -> bool {
        self.get_lock(path).try_lock()
    }

    /// Release the lock for `path`.
    pub fn unlock_file(&self, path: impl AsRef<Path>) -> Result<(), LockError> {
        let path = path.as_ref();
        let key = clean_path(path);
        let mutex = self.map().get(&key).cloned();

        match mutex {
            Some(mutex) if mutex.unlock() => {
                debug!("Unlocked {:?}", path);
                Ok(())
            }
            _ => Err(LockError::not_held(path)),
        }
    }

    /// Lock `path` and return a guard that releases it on drop.
    pub fn guard(&self, path: impl AsRef<Path>) -> FileLockGuard {
        let mutex = self.get_lock(path);
        mutex.lock();
        FileLockGuard { mutex }
    }

    /// Run `f` while holding the lock for `path`.
    ///
    /// The lock is released on every exit path, including a panic inside
    /// `f`. Whatever `f` returns is passed through.
    pub fn with_file_lock<T>(&self, path: impl AsRef<Path>, f: impl FnOnce() -> T) -> T {
        let _guard = self.guard(path);
        f()
    }

    /// Number of distinct paths that have ever been locked.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<FileMutex>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
