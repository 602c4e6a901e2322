//! Configuration management for the file-access layer.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables or defaults, and projected onto the
//! per-call option records used by the validator and the file store.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

use super::security::{DEFAULT_MAX_PATH_LENGTH, PathValidationOptions};
use crate::domains::files::{DEFAULT_FILE_MODE, FileOptions};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Sandbox and path validation configuration.
    pub security: SecurityConfig,

    /// How files are written.
    pub storage: StorageConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Configuration for the path sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Root directory all file operations must stay inside.
    /// If None, no path validation is performed.
    pub base_dir: Option<PathBuf>,

    /// Resolve symlinks and reject those pointing outside `base_dir`.
    pub check_symlinks: bool,

    /// Accept paths that do not exist yet.
    pub allow_non_existent: bool,

    /// Reject directories and special files.
    pub require_regular_file: bool,

    /// Maximum accepted path length in bytes.
    pub max_path_length: usize,
}

/// Configuration for file writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Create missing parent directories on write.
    pub create_dirs: bool,

    /// Permission bits for written files.
    pub mode: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            check_symlinks: true,
            allow_non_existent: true,
            require_regular_file: false,
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            create_dirs: true,
            mode: DEFAULT_FILE_MODE,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Variables are prefixed with `SAFE_FS_`, for example
    /// `SAFE_FS_BASE_DIR` or `SAFE_FS_LOG_LEVEL`. A `.env` file is honored.
    /// Values that fail to parse are reported and left at their default.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(level) = std::env::var("SAFE_FS_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(base_dir) = std::env::var("SAFE_FS_BASE_DIR") {
            config.security.base_dir = Some(PathBuf::from(base_dir));
            info!(
                "Path sandbox enabled: base directory set to {:?}",
                config.security.base_dir
            );
        } else {
            warn!(
                "SAFE_FS_BASE_DIR not set - path validation disabled. \
                 File operations will accept any path."
            );
        }

        let security = &mut config.security;
        parse_env("SAFE_FS_CHECK_SYMLINKS", &mut security.check_symlinks);
        parse_env("SAFE_FS_ALLOW_NON_EXISTENT", &mut security.allow_non_existent);
        parse_env("SAFE_FS_REQUIRE_REGULAR_FILE", &mut security.require_regular_file);
        parse_env("SAFE_FS_MAX_PATH_LENGTH", &mut security.max_path_length);

        parse_env("SAFE_FS_CREATE_DIRS", &mut config.storage.create_dirs);

        if let Ok(mode) = std::env::var("SAFE_FS_FILE_MODE") {
            match u32::from_str_radix(mode.trim_start_matches("0o"), 8) {
                Ok(mode) if mode <= 0o7777 => config.storage.mode = mode,
                _ => warn!("Ignoring invalid SAFE_FS_FILE_MODE '{}'", mode),
            }
        }

        config
    }

    /// Validation options described by the security section.
    pub fn validation_options(&self) -> PathValidationOptions {
        PathValidationOptions {
            require_regular_file: self.security.require_regular_file,
            allow_non_existent: self.security.allow_non_existent,
            check_symlinks: self.security.check_symlinks,
            max_path_length: self.security.max_path_length,
        }
    }

    /// File options described by the security and storage sections.
    pub fn file_options(&self) -> FileOptions {
        FileOptions {
            create_dirs: self.storage.create_dirs,
            mode: self.storage.mode,
            base_dir: self.security.base_dir.clone(),
            validate_options: self.validation_options(),
        }
    }
}

fn parse_env<T: FromStr>(key: &str, target: &mut T) {
    let Ok(raw) = std::env::var(key) else {
        return;
    };
    match raw.parse() {
        Ok(value) => *target = value,
        Err(_) => warn!("Ignoring invalid {} '{}'", key, raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    const KEYS: &[&str] = &[
        "SAFE_FS_LOG_LEVEL",
        "SAFE_FS_BASE_DIR",
        "SAFE_FS_CHECK_SYMLINKS",
        "SAFE_FS_ALLOW_NON_EXISTENT",
        "SAFE_FS_REQUIRE_REGULAR_FILE",
        "SAFE_FS_MAX_PATH_LENGTH",
        "SAFE_FS_CREATE_DIRS",
        "SAFE_FS_FILE_MODE",
    ];

    fn clear_env() {
        for key in KEYS {
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.security.base_dir.is_none());

        let options = config.validation_options();
        assert_eq!(options, PathValidationOptions::default());

        let file_options = config.file_options();
        assert_eq!(file_options, FileOptions::default());
    }

    #[test]
    fn test_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            std::env::set_var("SAFE_FS_BASE_DIR", "/srv/repo");
            std::env::set_var("SAFE_FS_CHECK_SYMLINKS", "false");
            std::env::set_var("SAFE_FS_MAX_PATH_LENGTH", "1024");
            std::env::set_var("SAFE_FS_FILE_MODE", "0644");
            std::env::set_var("SAFE_FS_LOG_LEVEL", "debug");
        }

        let config = Config::from_env();
        assert_eq!(config.security.base_dir, Some(PathBuf::from("/srv/repo")));
        assert!(!config.security.check_symlinks);
        assert_eq!(config.security.max_path_length, 1024);
        assert_eq!(config.storage.mode, 0o644);
        assert_eq!(config.logging.level, "debug");

        let options = config.file_options();
        assert_eq!(options.validation_base(), Some(std::path::Path::new("/srv/repo")));
        assert!(!options.validate_options.check_symlinks);

        clear_env();
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            std::env::set_var("SAFE_FS_CHECK_SYMLINKS", "sometimes");
            std::env::set_var("SAFE_FS_MAX_PATH_LENGTH", "-3");
            std::env::set_var("SAFE_FS_FILE_MODE", "rw-r--r--");
        }

        let config = Config::from_env();
        assert!(config.security.check_symlinks);
        assert_eq!(config.security.max_path_length, DEFAULT_MAX_PATH_LENGTH);
        assert_eq!(config.storage.mode, DEFAULT_FILE_MODE);
        assert!(config.security.base_dir.is_none());

        clear_env();
    }
}
