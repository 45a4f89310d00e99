// strix_sim/src/telemetry.rs

//! Log subscriber setup for the `strix` binary.
//!
//! `RUST_LOG` wins over the level passed on the command line.

use tracing_subscriber::EnvFilter;

use crate::error::{SimError, SimResult};

/// Resolves the log filter: `RUST_LOG` if set and valid, otherwise `fallback`.
pub fn env_filter(fallback: &str) -> SimResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(fallback)
            .map_err(|e| SimError::Telemetry(format!("bad log level '{fallback}': {e}"))),
    }
}

/// Installs the global subscriber. Call once, before the run starts.
pub fn init_tracing(log_level: &str, json: bool) -> SimResult<()> {
    let filter = env_filter(log_level)?;
    let result = if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init()
    };
    result.map_err(|e| SimError::Telemetry(e.to_string()))
}
