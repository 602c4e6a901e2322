//! File store error types.

use std::path::PathBuf;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::core::security::PathSecurityError;

/// Result type for file store operations.
pub type FileResult<T> = Result<T, FileError>;

/// Errors that can occur in file store operations.
///
/// Every variant that wraps an OS failure keeps it as the error source.
#[derive(Debug, Error)]
pub enum FileError {
    /// The path was rejected by the path validator.
    #[error("Path validation failed: {0}")]
    Validation(#[from] PathSecurityError),

    #[error("Failed to create directories for '{path}': {source}")]
    CreateDirs {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write temporary file '{path}': {source}")]
    WriteTemp {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to replace '{to}' with '{from}': {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File '{path}' is not valid UTF-8: {source}")]
    InvalidUtf8 {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },

    #[error("Failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy '{from}' to '{to}': {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to sync '{path}' to storage: {source}")]
    Sync {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to append to '{path}': {source}")]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk directory '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl FileError {
    /// True when the failure came from the path validator rather than I/O.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
