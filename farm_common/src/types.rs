//! Value types exchanged between components.
//!
//! - `Reading` - one sensor observation, moved through the reading channel
//! - `LogRecord` - one control decision, moved to the log sink
//! - `Thresholds` / `DeviceStates` - field groups of the shared state

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Operator-configured control thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Heater runs while temperature is strictly below this [°C].
    pub temp: i32,
    /// Fan runs while humidity is strictly above this [%].
    pub humidity: i32,
}

/// Actuator outputs decided by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceStates {
    /// Heater on.
    pub heater_on: bool,
    /// Fan on.
    pub fan_on: bool,
    /// Status LED on.
    pub led_on: bool,
}

/// One sensor observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Temperature [°C].
    pub temperature: f64,
    /// Relative humidity [%].
    pub humidity: f64,
    /// Time of observation.
    pub observed_at: DateTime<Local>,
}

impl Reading {
    /// Reading observed now.
    pub fn now(temperature: f64, humidity: f64) -> Self {
        Self {
            temperature,
            humidity,
            observed_at: Local::now(),
        }
    }
}

/// One control decision, as written to the decision log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Temperature that drove the decision [°C].
    pub temperature: f64,
    /// Humidity that drove the decision [%].
    pub humidity: f64,
    /// Heater decision.
    pub heater_on: bool,
    /// Fan decision.
    pub fan_on: bool,
    /// Observation time of the reading.
    pub observed_at: DateTime<Local>,
}

impl LogRecord {
    /// Record pairing a reading with the devices decided from it.
    pub fn new(reading: &Reading, devices: DeviceStates) -> Self {
        Self {
            temperature: reading.temperature,
            humidity: reading.humidity,
            heater_on: devices.heater_on,
            fan_on: devices.fan_on,
            observed_at: reading.observed_at,
        }
    }
}
