//! Farm Common Library
//!
//! This crate provides the shared building blocks used by every component of
//! the smart-farm workspace: the synchronized state record, the sensor reading
//! channel, record types and configuration loading.
//!
//! # Module Structure
//!
//! - [`state`] - `FarmState` and the scoped-access `StateHandle`
//! - [`channel`] - Ordered reading channel (sensor → controller)
//! - [`types`] - `Reading`, `LogRecord`, `Thresholds`, `DeviceStates`
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Defaults and limits
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! farm = { package = "farm_common", path = "../farm_common" }
//! ```
//!
//! ```rust
//! use farm_common::prelude::*;
//!
//! let state = StateHandle::new(FarmState::default());
//! let heater = state.with_state(|s| s.devices.heater_on);
//! assert!(!heater);
//! ```

pub mod channel;
pub mod config;
pub mod consts;
pub mod prelude;
pub mod state;
pub mod types;
