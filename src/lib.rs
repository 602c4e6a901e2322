//! Safe file-access layer for workflow tooling.
//!
//! Every privileged read or write made by the workflow scanner and updater
//! goes through this crate. It validates paths against a sandbox root,
//! serializes mutations per path and writes files atomically.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - **core**: Configuration, error handling, logging and the path validator
//! - **domains**: File-access logic organized by bounded contexts
//!   - **locks**: Per-path in-process lock registry
//!   - **files**: Atomic file operations and the `FileStore` service
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use workflow_safe_fs::{Config, FileStore, LockRegistry};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env();
//!     workflow_safe_fs::core::init_logging(&config.logging.level)?;
//!
//!     let locks = Arc::new(LockRegistry::new());
//!     let store = FileStore::from_config(&config, Arc::clone(&locks));
//!     let path = store.resolve([".github", "workflows", "ci.yml"])?;
//!     store.modify_lines(&path, |line, _| line.replace("@v3", "@v4"))?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, Result};
pub use domains::files::{FileError, FileOptions, FileStore};
pub use domains::locks::LockRegistry;
