//! Operator console: the only writer of the control thresholds.
//!
//! Updates go through the same scoped access as every other component, so the
//! controller sees either the old or the new threshold for a whole decision,
//! never a mix.

pub use farm_common::consts::{HUMIDITY_THRESHOLD_RANGE, TEMP_THRESHOLD_RANGE};
use farm_common::state::{FarmState, StateHandle};
use farm_common::types::Thresholds;
use std::ops::RangeInclusive;
use thiserror::Error;
use tracing::info;

/// Rejected console command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    /// Value outside the accepted range.
    #[error("{what} threshold {value} out of range {min}..={max}")]
    OutOfRange {
        /// Which threshold.
        what: &'static str,
        /// Requested value.
        value: i32,
        /// Lower bound.
        min: i32,
        /// Upper bound.
        max: i32,
    },

    /// The system is shutting down.
    #[error("system is stopping, settings are frozen")]
    Stopped,
}

/// Threshold editor bound to the shared state.
#[derive(Debug, Clone)]
pub struct OperatorConsole {
    state: StateHandle,
}

impl OperatorConsole {
    /// Console writing to `state`.
    pub fn new(state: StateHandle) -> Self {
        Self { state }
    }

    /// Set the temperature threshold [°C].
    pub fn set_temp_threshold(&self, value: i32) -> Result<Thresholds, ConsoleError> {
        check("temperature", value, &TEMP_THRESHOLD_RANGE)?;
        let updated = self.update(|t| t.temp = value)?;
        info!("Temperature threshold set to {}°C", value);
        Ok(updated)
    }

    /// Set the humidity threshold [%].
    pub fn set_humidity_threshold(&self, value: i32) -> Result<Thresholds, ConsoleError> {
        check("humidity", value, &HUMIDITY_THRESHOLD_RANGE)?;
        let updated = self.update(|t| t.humidity = value)?;
        info!("Humidity threshold set to {}%", value);
        Ok(updated)
    }

    /// Current thresholds.
    pub fn settings(&self) -> Thresholds {
        self.state.with_state(|s| s.thresholds)
    }

    /// Copy of the whole shared record.
    pub fn status(&self) -> FarmState {
        self.state.snapshot()
    }

    fn update(&self, f: impl FnOnce(&mut Thresholds)) -> Result<Thresholds, ConsoleError> {
        self.state.with_state(|s| {
            if !s.running {
                return Err(ConsoleError::Stopped);
            }
            f(&mut s.thresholds);
            Ok(s.thresholds)
        })
    }
}

fn check(what: &'static str, value: i32, range: &RangeInclusive<i32>) -> Result<(), ConsoleError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConsoleError::OutOfRange {
            what,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}
