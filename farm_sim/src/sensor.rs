//! Sensor loop: the producer side of the reading channel.
//!
//! Every tick the loop reads the heater/fan outputs from the shared state,
//! asks its driver for a sample, and sends every `send_every`-th sample to the
//! controller. It stops when the run flag drops or the channel is closed.

use crate::driver::{DriverError, SensorDriver};
use farm_common::channel::ReadingSender;
use farm_common::config::SensorConfig;
use farm_common::state::StateReader;
use std::io;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorStats {
    /// Ticks executed.
    pub ticks: u64,
    /// Readings accepted by the channel.
    pub sent: u64,
}

/// Producer thread body.
pub struct SensorLoop {
    driver: Box<dyn SensorDriver>,
    state: StateReader,
    tx: ReadingSender,
    tick: Duration,
    send_every: u32,
    stats: SensorStats,
}

impl SensorLoop {
    /// Initialize `driver` and bind it to the state and channel.
    ///
    /// # Errors
    /// Propagates driver initialization failures.
    pub fn new(
        mut driver: Box<dyn SensorDriver>,
        config: &SensorConfig,
        state: StateReader,
        tx: ReadingSender,
    ) -> Result<Self, DriverError> {
        driver.init(config)?;
        info!(
            "Sensor loop using driver {} v{} (tick={}ms, send every {} ticks)",
            driver.name(),
            driver.version(),
            config.tick_ms,
            config.send_every
        );
        Ok(Self {
            driver,
            state,
            tx,
            tick: config.tick(),
            send_every: config.send_every.max(1),
            stats: SensorStats::default(),
        })
    }

    /// Run on a dedicated thread named `sensor`.
    pub fn spawn(self) -> io::Result<JoinHandle<SensorStats>> {
        thread::Builder::new()
            .name("sensor".to_string())
            .spawn(move || self.run())
    }

    /// Tick until the run flag is cleared or the channel closes.
    pub fn run(mut self) -> SensorStats {
        let mut last_tick: Option<Instant> = None;

        while self.state.is_running() {
            let tick_start = Instant::now();
            // The first sample covers one nominal tick.
            let dt = last_tick.map_or(self.tick, |last| tick_start.duration_since(last));
            last_tick = Some(tick_start);

            let devices = self.state.with_state(|s| s.devices);
            let reading = self.driver.sample(devices, dt);

            if self.stats.ticks % u64::from(self.send_every) == 0 {
                if self.tx.send(reading).is_err() {
                    info!("Reading channel closed, sensor loop stopping");
                    break;
                }
                self.stats.sent += 1;
                debug!(
                    "Sensor sent {:.2}°C {:.2}%",
                    reading.temperature, reading.humidity
                );
            }
            self.stats.ticks += 1;

            let elapsed = tick_start.elapsed();
            if elapsed < self.tick {
                thread::sleep(self.tick - elapsed);
            }
        }

        if let Err(e) = self.driver.shutdown() {
            warn!("Sensor driver shutdown failed: {}", e);
        }
        info!(
            "Sensor loop stopped after {} ticks ({} readings sent)",
            self.stats.ticks, self.stats.sent
        );
        self.stats
    }
}
