//! Per-call file operation options.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::security::{PathSecurityError, PathValidationOptions, validate_path};

/// Permission bits for files created by atomic writes.
pub const DEFAULT_FILE_MODE: u32 = 0o600;

/// Options shared by the file store operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOptions {
    /// Create missing parent directories before writing.
    pub create_dirs: bool,

    /// Unix permission bits applied to written files. Ignored elsewhere.
    pub mode: u32,

    /// Sandbox root. `None` (or an empty path) skips validation entirely.
    pub base_dir: Option<PathBuf>,

    /// How strictly paths are checked against `base_dir`.
    pub validate_options: PathValidationOptions,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            create_dirs: true,
            mode: DEFAULT_FILE_MODE,
            base_dir: None,
            validate_options: PathValidationOptions::default(),
        }
    }
}

impl FileOptions {
    /// Default options sandboxed to `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
            ..Self::default()
        }
    }

    /// The configured sandbox root, if validation is enabled.
    pub fn validation_base(&self) -> Option<&Path> {
        self.base_dir
            .as_deref()
            .filter(|base| !base.as_os_str().is_empty())
    }

    /// Validate `path` against the sandbox root, if one is configured.
    pub fn validate(&self, path: &Path) -> Result<(), PathSecurityError> {
        match self.validation_base() {
            Some(base) => validate_path(base, path, &self.validate_options),
            None => Ok(()),
        }
    }
}
