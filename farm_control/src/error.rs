//! Startup error type for the controller.
//!
//! Only startup can fail: once every thread is running, failures are logged
//! and contained by the component that saw them.

use farm_common::config::ConfigError;
use farm_sim::DriverError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort system startup.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Configuration failed to load or validate.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Sensor driver could not be created or initialized.
    #[error("Sensor driver error: {0}")]
    Driver(#[from] DriverError),

    /// Decision log could not be opened for appending.
    #[error("Failed to open log file {path:?}: {source}")]
    LogOpen {
        /// Configured log path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A component thread could not be spawned.
    #[error("Failed to spawn {component} thread: {source}")]
    Spawn {
        /// Component name.
        component: &'static str,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Result type for startup paths.
pub type ControlResult<T> = Result<T, ControlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_error_names_component() {
        let err = ControlError::Spawn {
            component: "controller",
            source: io::Error::other("no threads left"),
        };
        let msg = err.to_string();
        assert!(msg.contains("controller"));
        assert!(msg.contains("no threads left"));
    }

    #[test]
    fn config_error_converts() {
        let err: ControlError = ConfigError::ValidationError("bad".into()).into();
        assert!(matches!(err, ControlError::Config(_)));
    }
}
