//! Domain modules containing the file-access business logic.
//!
//! - **locks**: per-path, in-process mutual exclusion
//! - **files**: sandboxed, atomic file operations and the `FileStore` service

pub mod files;
pub mod locks;
