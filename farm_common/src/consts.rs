//! System-wide constants for the smart-farm workspace.
//!
//! Single source of truth for defaults and limits. Configuration defaults in
//! [`crate::config`] refer back to these values.

use std::ops::RangeInclusive;
use std::time::Duration;

/// Default temperature threshold [°C]. Heater runs below it.
pub const DEFAULT_TEMP_THRESHOLD: i32 = 28;

/// Default humidity threshold [%]. Fan runs above it.
pub const DEFAULT_HUMIDITY_THRESHOLD: i32 = 70;

/// Accepted temperature thresholds [°C], at startup and from the console.
pub const TEMP_THRESHOLD_RANGE: RangeInclusive<i32> = -20..=60;

/// Accepted humidity thresholds [%], at startup and from the console.
pub const HUMIDITY_THRESHOLD_RANGE: RangeInclusive<i32> = 0..=100;

/// Temperature reported before the first reading is processed [°C].
pub const INITIAL_TEMP: f64 = 25.0;

/// Humidity reported before the first reading is processed [%].
pub const INITIAL_HUMIDITY: f64 = 50.0;

/// Controller cycle period in milliseconds.
pub const CONTROL_CYCLE_MS: u64 = 1000;

/// Alert monitor tick period in milliseconds.
pub const ALERT_PERIOD_MS: u64 = 3000;

/// High-temperature alert fires above `temp_threshold + margin`.
pub const HIGH_TEMP_MARGIN: i32 = 5;

/// Absolute low-temperature alert floor [°C].
pub const LOW_TEMP_FLOOR: f64 = 20.0;

/// High-humidity alert fires above `humidity_threshold + margin`.
pub const HIGH_HUMIDITY_MARGIN: i32 = 10;

/// Default decision log file.
pub const DEFAULT_LOG_PATH: &str = "smartfarm.log";

/// Default capacity of the controller → log sink queue.
pub const LOG_QUEUE_CAPACITY: usize = 256;

/// Attempts per log line before the record is dropped.
pub const LOG_WRITE_RETRIES: u32 = 3;

/// Sensor simulation tick in milliseconds.
pub const SENSOR_TICK_MS: u64 = 500;

/// A reading is sent every N sensor ticks.
pub const SENSOR_SEND_EVERY: u32 = 2;

/// Actuator panel refresh period in milliseconds.
pub const ACTUATOR_PERIOD_MS: u64 = 1000;

/// Upper bound on waiting for the state lock when polling the run flag.
pub const RUN_FLAG_POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/farm.toml";

/// Canonical service name (used in logs).
pub const SERVICE_NAME: &str = "smartfarm";
