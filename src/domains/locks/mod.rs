//! Lock domain module.
//!
//! Provides in-process, per-path mutual exclusion for file mutations. Locks
//! are keyed by the lexically cleaned path string, so two spellings of the
//! same path share a lock while two different paths aliasing one inode do
//! not. Nothing here coordinates across processes.
//!
//! ## Architecture
//!
//! - `registry.rs` - `LockRegistry` and the per-path `FileMutex`
//! - `error.rs` - Lock-specific error types

mod error;
mod registry;

pub use error::LockError;
pub use registry::{FileLockGuard, FileMutex, LockRegistry};
