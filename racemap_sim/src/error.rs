//! Error types for the simulation harness.

use racemap_core::{ConfigError, TrackError};
use thiserror::Error;

/// Errors that can occur while setting up or running a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// The track could not be finalized
    #[error("Track error: {0}")]
    Track(#[from] TrackError),

    /// The pipeline configuration is unusable
    #[error(transparent)]
    Pipeline(#[from] ConfigError),

    /// Reading the track payload or config failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration JSON is malformed
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration values are unusable
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl SimError {
    /// Creates an invalid-config error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
