//! # Farm Control
//!
//! Controller side of the smart farm: decides heater and fan outputs from
//! sensor readings, records every decision in an append-only log, raises
//! threshold alerts and stops all of it in a defined order.
//!
//! # Module Structure
//!
//! - [`policy`] - Pure threshold policy
//! - [`controller`] - Control loop and cycle statistics
//! - [`log_sink`] - Bounded drop-oldest hand-off and the log writer thread
//! - [`alert`] - Alert rules and the periodic monitor
//! - [`console`] - Threshold editing
//! - [`actuator`] - Read-only device panel
//! - [`shutdown`] - Stop sequence and final report
//! - [`system`] - Wiring and startup
//! - [`error`] - Startup errors
//!
//! # Architecture
//!
//! ```text
//!  SensorLoop ──Reading──▶ ReadingChannel ──poll──▶ Controller ──LogRecord──▶ LogSink ──▶ file
//!      ▲                                               │
//!      │ heater/fan                                    │ devices, readings
//!      │                                               ▼
//!      └──────────────────── SharedState ◀──── thresholds ──── OperatorConsole
//!                              │      │
//!                  AlertMonitor┘      └ActuatorPanel
//! ```

#![deny(missing_docs)]

pub mod actuator;
pub mod alert;
pub mod console;
pub mod controller;
pub mod error;
pub mod log_sink;
pub mod policy;
pub mod shutdown;
pub mod system;

pub use crate::alert::{Alert, AlertHandler, AlertKind, AlertMonitor, AlertRules, AlertSet};
pub use crate::console::{ConsoleError, OperatorConsole};
pub use crate::controller::{Controller, CycleOutcome, CycleStats};
pub use crate::error::{ControlError, ControlResult};
pub use crate::log_sink::{LogSink, LogSinkStats, log_channel};
pub use crate::policy::decide;
pub use crate::shutdown::{ShutdownCoordinator, ShutdownPhase, ShutdownReport};
pub use crate::system::{FarmSystem, FarmSystemBuilder};
