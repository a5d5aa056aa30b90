//! Tracing subscriber setup.

use anyhow::{anyhow, Result};
use tracing::Level;

/// Maps the `-v` count to a maximum log level.
pub(crate) const fn verbosity_level(v: u8) -> Level {
    match v {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initializes the tracing subscriber
///
/// # Arguments
/// * `verbosity` - The verbosity level (0-4)
///
/// # Returns
/// * `Result<()>` - Ok if successful, Err otherwise.
pub(crate) fn init_tracing_subscriber(verbosity: u8) -> Result<()> {
    let subscriber = tracing_subscriber::fmt().with_max_level(verbosity_level(verbosity)).finish();
    tracing::subscriber::set_global_default(subscriber).map_err(|e| anyhow!(e))
}
