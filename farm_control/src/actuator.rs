//! Actuator panel: read-only view of the device outputs.
//!
//! Periodically snapshots heater, fan and LED flags with the last readings and
//! reports every device transition. It holds a [`StateReader`] and cannot
//! write the shared state.

use farm_common::state::StateReader;
use farm_common::types::DeviceStates;
use std::fmt;
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

/// What the panel shows at one refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorStatus {
    /// Device outputs.
    pub devices: DeviceStates,
    /// Last processed temperature [°C].
    pub temperature: f64,
    /// Last processed humidity [%].
    pub humidity: f64,
}

impl fmt::Display for ActuatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool| if on { "ON" } else { "OFF" };
        write!(
            f,
            "heater [{}] fan [{}] led [{}] at {:.1}°C / {:.1}%",
            flag(self.devices.heater_on),
            flag(self.devices.fan_on),
            flag(self.devices.led_on),
            self.temperature,
            self.humidity
        )
    }
}

/// Periodic device monitor.
pub struct ActuatorPanel {
    state: StateReader,
    period: Duration,
    last: Option<DeviceStates>,
    transitions: u64,
}

impl ActuatorPanel {
    /// Panel refreshing every `period`.
    pub fn new(state: StateReader, period: Duration) -> Self {
        Self {
            state,
            period,
            last: None,
            transitions: 0,
        }
    }

    /// Take one snapshot; returns it with `true` if the devices changed.
    pub fn refresh(&mut self) -> (ActuatorStatus, bool) {
        let status = self.state.with_state(|s| ActuatorStatus {
            devices: s.devices,
            temperature: s.current_temp,
            humidity: s.current_humidity,
        });
        let changed = self.last != Some(status.devices);
        if changed {
            if self.last.is_some() {
                self.transitions += 1;
            }
            info!("Actuators: {}", status);
        } else {
            debug!("Actuators: {}", status);
        }
        self.last = Some(status.devices);
        (status, changed)
    }

    /// Device transitions seen so far (the first snapshot is not one).
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Refresh until the run flag is cleared.
    pub fn run(mut self) {
        while self.state.is_running() {
            self.refresh();
            thread::sleep(self.period);
        }
        info!("Actuator panel stopped after {} transitions", self.transitions);
    }

    /// Run on a dedicated thread named `actuator`.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("actuator".to_string())
            .spawn(move || self.run())
    }
}
