//! Lock-specific error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while releasing file locks.
#[derive(Debug, Error)]
pub enum LockError {
    /// The path was unlocked without being locked first.
    #[error("Lock for '{path}' is not held")]
    NotHeld { path: PathBuf },
}

impl LockError {
    /// Create a new "not held" error.
    pub fn not_held(path: impl Into<PathBuf>) -> Self {
        Self::NotHeld { path: path.into() }
    }
}
