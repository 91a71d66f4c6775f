//! Sensor driver trait and error types.
//!
//! This module defines:
//! - `SensorDriver` trait - Interface for pluggable sensor backends
//! - `DriverError` enum - Error types for driver operations
//! - `DriverFactory` type alias - Factory function type

use farm_common::config::SensorConfig;
use farm_common::types::{DeviceStates, Reading};
use std::time::Duration;
use thiserror::Error;

/// Error types for sensor driver operations.
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No driver registered under the configured name
    #[error("Unknown sensor driver '{name}' (available: {available})")]
    DriverNotFound {
        /// Requested name
        name: String,
        /// Registered names, comma separated
        available: String,
    },

    /// A driver with this name is already registered
    #[error("Sensor driver '{0}' is already registered")]
    DuplicateDriver(String),
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn() -> Box<dyn SensorDriver>;

/// Trait defining the interface for sensor drivers.
///
/// The sensor loop owns one driver and calls it from its own thread.
///
/// # Lifecycle
///
/// 1. `init()` - Called once before the first tick
/// 2. `sample()` - Called every sensor tick
/// 3. `shutdown()` - Called when the sensor loop exits
pub trait SensorDriver: Send {
    /// Returns the driver's unique identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Initialize the driver from the `[sensor]` configuration.
    ///
    /// # Errors
    /// Return `DriverError::InitFailed` if initialization cannot complete.
    fn init(&mut self, config: &SensorConfig) -> Result<(), DriverError>;

    /// Produce one observation.
    ///
    /// # Arguments
    /// * `devices` - Actuator outputs currently in the shared state
    /// * `dt` - Elapsed time since the previous tick
    fn sample(&mut self, devices: DeviceStates, dt: Duration) -> Reading;

    /// Graceful shutdown of the driver.
    fn shutdown(&mut self) -> Result<(), DriverError>;
}
