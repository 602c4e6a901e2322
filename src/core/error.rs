//! Error types and handling for the file-access layer.
//!
//! This module defines a unified error type that can represent errors from
//! all domains, for callers that want a single error to propagate.

use thiserror::Error;

/// A specialized Result type for file-access operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A path was rejected by the validator.
    #[error("Path security error: {0}")]
    PathSecurity(#[from] crate::core::security::PathSecurityError),

    /// Error originating from the files domain.
    #[error("File error: {0}")]
    File(#[from] crate::domains::files::FileError),

    /// Error originating from the locks domain.
    #[error("Lock error: {0}")]
    Lock(#[from] crate::domains::locks::LockError),

    /// Internal errors that should not occur under normal operation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
