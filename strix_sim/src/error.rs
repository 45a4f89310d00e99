// strix_sim/src/error.rs

use std::path::PathBuf;
use strix_core::error::FilterError;
use thiserror::Error;

/// Everything that can stop a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("scenario file not found: {}", .0.display())]
    ScenarioNotFound(PathBuf),

    #[error("failed to load scenario: {0}")]
    Config(#[from] figment::Error),

    #[error("failed to render scenario as TOML: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("agent '{0}' panicked")]
    AgentPanicked(String),

    #[error("failed to install log subscriber: {0}")]
    Telemetry(String),
}

pub type SimResult<T> = Result<T, SimError>;
