//! Simulation driver implementation.
//!
//! The `SimulationDriver` implements the `SensorDriver` trait on top of the
//! [`ClimateModel`], so the controller can be exercised without hardware.
//! The model advances by `dt / tick` ticks per sample, so a late or early
//! sample moves the climate in proportion to the time that actually passed.

use crate::driver::{DriverError, SensorDriver};
use crate::physics::{ClimateModel, ClimateParams};
use farm_common::config::SensorConfig;
use farm_common::types::{DeviceStates, Reading};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest gap, in ticks, applied by a single sample.
const MAX_TICKS_PER_SAMPLE: f64 = 10.0;

/// Simulation driver implementing the SensorDriver trait.
pub struct SimulationDriver {
    /// Climate model (set on init)
    model: Option<ClimateModel>,
    /// Nominal tick the model rates refer to
    tick: Duration,
    /// Noise source
    rng: StdRng,
    /// Ticks sampled so far
    samples: u64,
}

impl SimulationDriver {
    /// Create a new simulation driver seeded from entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a simulation driver with a fixed seed (reproducible noise).
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            model: None,
            tick: SensorConfig::default().tick(),
            rng,
            samples: 0,
        }
    }

    /// Current model state, if initialized.
    pub fn model(&self) -> Option<&ClimateModel> {
        self.model.as_ref()
    }

    fn ticks(&self, dt: Duration) -> f64 {
        if self.tick.is_zero() {
            return 1.0;
        }
        (dt.as_secs_f64() / self.tick.as_secs_f64()).clamp(0.0, MAX_TICKS_PER_SAMPLE)
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn init(&mut self, config: &SensorConfig) -> Result<(), DriverError> {
        if !config.initial_temp.is_finite() || !config.initial_humidity.is_finite() {
            return Err(DriverError::ConfigError(
                "initial conditions must be finite".to_string(),
            ));
        }
        info!(
            "Initializing simulation driver at {:.1}°C / {:.1}%",
            config.initial_temp, config.initial_humidity
        );
        self.model = Some(ClimateModel::new(
            config.initial_temp,
            config.initial_humidity,
            ClimateParams::default(),
        ));
        self.tick = config.tick();
        self.samples = 0;
        Ok(())
    }

    fn sample(&mut self, devices: DeviceStates, dt: Duration) -> Reading {
        let ticks = self.ticks(dt);
        let model = self.model.get_or_insert_with(|| {
            warn!("Simulation driver sampled before init, using default conditions");
            let defaults = SensorConfig::default();
            ClimateModel::new(
                defaults.initial_temp,
                defaults.initial_humidity,
                ClimateParams::default(),
            )
        });
        model.advance_noisy(devices.heater_on, devices.fan_on, ticks, &mut self.rng);
        self.samples += 1;
        debug!(
            "Simulation tick {} (dt={:?}, {:.2} ticks): {:.2}°C {:.2}%",
            self.samples,
            dt,
            ticks,
            model.temperature(),
            model.humidity()
        );
        Reading::now(model.temperature(), model.humidity())
    }

    fn shutdown(&mut self) -> Result<(), DriverError> {
        info!("Shutting down simulation driver after {} samples", self.samples);
        self.model = None;
        Ok(())
    }
}

/// Factory function to create a simulation driver instance.
pub fn create_driver() -> Box<dyn SensorDriver> {
    Box::new(SimulationDriver::new())
}
