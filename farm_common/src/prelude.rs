//! Prelude module for common re-exports.
//!
//! ```rust
//! use farm_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    AlertConfig, ConfigError, ConfigLoader, FarmConfig, LogConfig, LogFormat, LogLevel,
    SharedConfig,
};

// ─── Shared State ───────────────────────────────────────────────────
pub use crate::state::{FarmState, StateHandle, StateReader};

// ─── Reading Channel ────────────────────────────────────────────────
pub use crate::channel::{ChannelError, ReadingChannel, ReadingReceiver, ReadingSender};

// ─── Records ────────────────────────────────────────────────────────
pub use crate::types::{DeviceStates, LogRecord, Reading, Thresholds};
