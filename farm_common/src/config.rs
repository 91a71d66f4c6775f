//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load the TOML configuration of
//! the smart-farm system.
//!
//! # Usage
//!
//! ```rust,no_run
//! use farm_common::config::{ConfigError, FarmConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = FarmConfig::load_or_default(Path::new("config/farm.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use crate::consts::{
    ACTUATOR_PERIOD_MS, ALERT_PERIOD_MS, CONTROL_CYCLE_MS, DEFAULT_HUMIDITY_THRESHOLD,
    DEFAULT_LOG_PATH, DEFAULT_TEMP_THRESHOLD, HIGH_HUMIDITY_MARGIN, HIGH_TEMP_MARGIN,
    HUMIDITY_THRESHOLD_RANGE, INITIAL_HUMIDITY, INITIAL_TEMP, LOG_QUEUE_CAPACITY,
    LOG_WRITE_RETRIES, LOW_TEMP_FLOOR, SENSOR_SEND_EVERY, SENSOR_TICK_MS, SERVICE_NAME,
    TEMP_THRESHOLD_RANGE,
};
use crate::types::Thresholds;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Common configuration fields shared by every farm binary.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "greenhouse-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

fn default_service_name() -> String {
    SERVICE_NAME.to_string()
}

fn default_temp_threshold() -> i32 {
    DEFAULT_TEMP_THRESHOLD
}

fn default_humidity_threshold() -> i32 {
    DEFAULT_HUMIDITY_THRESHOLD
}

fn default_cycle_ms() -> u64 {
    CONTROL_CYCLE_MS
}

fn default_alert_period_ms() -> u64 {
    ALERT_PERIOD_MS
}

fn default_high_temp_margin() -> i32 {
    HIGH_TEMP_MARGIN
}

fn default_low_temp_floor() -> f64 {
    LOW_TEMP_FLOOR
}

fn default_high_humidity_margin() -> i32 {
    HIGH_HUMIDITY_MARGIN
}

fn default_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_PATH)
}

fn default_queue_capacity() -> usize {
    LOG_QUEUE_CAPACITY
}

fn default_write_retries() -> u32 {
    LOG_WRITE_RETRIES
}

fn default_driver() -> String {
    "simulation".to_string()
}

fn default_tick_ms() -> u64 {
    SENSOR_TICK_MS
}

fn default_send_every() -> u32 {
    SENSOR_SEND_EVERY
}

fn default_initial_temp() -> f64 {
    INITIAL_TEMP
}

fn default_initial_humidity() -> f64 {
    INITIAL_HUMIDITY
}

fn default_actuator_period_ms() -> u64 {
    ACTUATOR_PERIOD_MS
}

fn default_true() -> bool {
    true
}

/// Controller settings (`[control]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Initial temperature threshold [°C].
    #[serde(default = "default_temp_threshold")]
    pub temp_threshold: i32,

    /// Initial humidity threshold [%].
    #[serde(default = "default_humidity_threshold")]
    pub humidity_threshold: i32,

    /// Control cycle period in milliseconds.
    #[serde(default = "default_cycle_ms")]
    pub cycle_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            temp_threshold: default_temp_threshold(),
            humidity_threshold: default_humidity_threshold(),
            cycle_ms: default_cycle_ms(),
        }
    }
}

impl ControlConfig {
    /// Control cycle period.
    pub fn cycle(&self) -> Duration {
        Duration::from_millis(self.cycle_ms)
    }

    /// Thresholds the shared state starts with.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            temp: self.temp_threshold,
            humidity: self.humidity_threshold,
        }
    }
}

/// Alert monitor settings (`[alert]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Tick period in milliseconds.
    #[serde(default = "default_alert_period_ms")]
    pub period_ms: u64,

    /// High-temperature alert margin above the temperature threshold [°C].
    #[serde(default = "default_high_temp_margin")]
    pub high_temp_margin: i32,

    /// Absolute low-temperature floor [°C].
    #[serde(default = "default_low_temp_floor")]
    pub low_temp_floor: f64,

    /// High-humidity alert margin above the humidity threshold [%].
    #[serde(default = "default_high_humidity_margin")]
    pub high_humidity_margin: i32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            period_ms: default_alert_period_ms(),
            high_temp_margin: default_high_temp_margin(),
            low_temp_floor: default_low_temp_floor(),
            high_humidity_margin: default_high_humidity_margin(),
        }
    }
}

impl AlertConfig {
    /// Tick period.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

/// Decision log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Fixed-width columns, one record per line.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Decision log settings (`[log]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Append-only log file.
    #[serde(default = "default_log_path")]
    pub path: PathBuf,

    /// Controller → sink queue capacity. Oldest record is dropped when full.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Write attempts per record before it is dropped.
    #[serde(default = "default_write_retries")]
    pub write_retries: u32,

    /// Line format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
            queue_capacity: default_queue_capacity(),
            write_retries: default_write_retries(),
            format: LogFormat::default(),
        }
    }
}

/// Sensor (stimulus source) settings (`[sensor]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Registered driver name.
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Simulation tick in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Send one reading every N ticks.
    #[serde(default = "default_send_every")]
    pub send_every: u32,

    /// Starting temperature of the simulated environment [°C].
    #[serde(default = "default_initial_temp")]
    pub initial_temp: f64,

    /// Starting humidity of the simulated environment [%].
    #[serde(default = "default_initial_humidity")]
    pub initial_humidity: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            tick_ms: default_tick_ms(),
            send_every: default_send_every(),
            initial_temp: default_initial_temp(),
            initial_humidity: default_initial_humidity(),
        }
    }
}

impl SensorConfig {
    /// Simulation tick.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Actuator panel settings (`[actuator]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuatorConfig {
    /// Run the read-only actuator panel.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Refresh period in milliseconds.
    #[serde(default = "default_actuator_period_ms")]
    pub period_ms: u64,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period_ms: default_actuator_period_ms(),
        }
    }
}

impl ActuatorConfig {
    /// Refresh period.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

/// Complete system configuration loaded from `farm.toml`.
///
/// Every section is optional; missing keys take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FarmConfig {
    /// Common fields.
    #[serde(default)]
    pub shared: SharedConfig,
    /// Controller.
    #[serde(default)]
    pub control: ControlConfig,
    /// Alert monitor.
    #[serde(default)]
    pub alert: AlertConfig,
    /// Decision log.
    #[serde(default)]
    pub log: LogConfig,
    /// Stimulus source.
    #[serde(default)]
    pub sensor: SensorConfig,
    /// Actuator panel.
    #[serde(default)]
    pub actuator: ActuatorConfig,
}

impl FarmConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    ///
    /// # Errors
    /// Parse failures and validation failures are returned; a missing file is not.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        let config = match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::FileNotFound) => {
                info!("No config at {:?}, using defaults", path);
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Validation Rules
    /// 1. `service_name` not empty
    /// 2. all periods > 0
    /// 3. `queue_capacity` > 0, `write_retries` > 0
    /// 4. `send_every` > 0
    /// 5. thresholds within `TEMP_THRESHOLD_RANGE` / `HUMIDITY_THRESHOLD_RANGE`
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        let periods = [
            ("control.cycle_ms", self.control.cycle_ms),
            ("alert.period_ms", self.alert.period_ms),
            ("sensor.tick_ms", self.sensor.tick_ms),
            ("actuator.period_ms", self.actuator.period_ms),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be greater than 0"
                )));
            }
        }

        if self.log.queue_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "log.queue_capacity must be greater than 0".to_string(),
            ));
        }
        if self.log.write_retries == 0 {
            return Err(ConfigError::ValidationError(
                "log.write_retries must be greater than 0".to_string(),
            ));
        }
        if self.sensor.send_every == 0 {
            return Err(ConfigError::ValidationError(
                "sensor.send_every must be greater than 0".to_string(),
            ));
        }
        let thresholds = [
            ("control.temp_threshold", self.control.temp_threshold, TEMP_THRESHOLD_RANGE),
            (
                "control.humidity_threshold",
                self.control.humidity_threshold,
                HUMIDITY_THRESHOLD_RANGE,
            ),
        ];
        for (name, value, range) in thresholds {
            if !range.contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} {value} outside {}..={}",
                    range.start(),
                    range.end()
                )));
            }
        }
        Ok(())
    }
}
