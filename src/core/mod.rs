//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the file-access
//! layer: error handling, configuration, logging setup and the path
//! validator that forms the sandbox boundary.

pub mod config;
pub mod error;
pub mod logging;
pub mod security;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use security::{PathSecurityError, PathValidationOptions, validate_path};
