//! # Farm Sensor Simulation
//!
//! Stimulus source for the smart-farm controller: pluggable sensor drivers and
//! the thread that turns driver samples into readings on the reading channel.
//!
//! # Module Structure
//!
//! - [`driver`] - `SensorDriver` trait and `DriverError`
//! - [`driver_registry`] - Driver selection by configured name
//! - [`physics`] - Climate model (heater/fan dynamics with jitter)
//! - [`simulation`] - `SimulationDriver` built on the climate model
//! - [`sensor`] - `SensorLoop`, the producer thread
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐ heater/fan ┌──────────────┐  Reading   ┌─────────────────┐
//! │  SharedState  ├───────────►│  SensorLoop  ├───────────►│ ReadingChannel  │
//! │ (read-only)   │            │   (thread)   │            │  → Controller   │
//! └───────────────┘            └──────┬───────┘            └─────────────────┘
//!                                     │ sample()
//!                              ┌──────▼───────┐
//!                              │ SensorDriver │ (trait object)
//!                              └──────────────┘
//! ```

#![deny(missing_docs)]

pub mod driver;
pub mod driver_registry;
pub mod physics;
pub mod sensor;
pub mod simulation;

pub use crate::driver::{DriverError, SensorDriver};
pub use crate::driver_registry::DriverRegistry;
pub use crate::sensor::{SensorLoop, SensorStats};
pub use crate::simulation::SimulationDriver;
