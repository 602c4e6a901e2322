//! Logging setup.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

use super::error::{Error, Result};

/// Initialize the logging subsystem.
///
/// Configures tracing with the specified log level, writing to stderr.
/// `RUST_LOG` directives are honored on top of `level`. Fails if a global
/// subscriber is already installed.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(parse_level(level).into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::internal(format!("failed to install subscriber: {e}")))
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
