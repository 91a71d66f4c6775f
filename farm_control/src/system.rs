//! System wiring: builds the shared state and channels, spawns every task and
//! hands their handles to the [`ShutdownCoordinator`].
//!
//! All fallible resource acquisition (config validation, driver init, log file
//! open) happens before the first thread is spawned, so a startup failure
//! leaves nothing running. If a spawn fails part-way, the tasks already
//! started are stopped before the error is returned.

use crate::actuator::ActuatorPanel;
use crate::alert::{AlertHandler, AlertMonitor, AlertRules, TracingAlertHandler};
use crate::console::OperatorConsole;
use crate::controller::Controller;
use crate::error::{ControlError, ControlResult};
use crate::log_sink::{LogSink, log_channel};
use crate::shutdown::{ShutdownCoordinator, ShutdownPhase, ShutdownReport};
use farm_common::channel::{ReadingChannel, ReadingSender};
use farm_common::config::FarmConfig;
use farm_common::state::{FarmState, StateHandle};
use farm_sim::{SensorDriver, SensorLoop};
use std::io;
use std::sync::Arc;
use tracing::info;

/// Startup options on top of [`FarmConfig`].
pub struct FarmSystemBuilder {
    config: FarmConfig,
    driver: Option<Box<dyn SensorDriver>>,
    alert_handler: Arc<dyn AlertHandler>,
}

impl FarmSystemBuilder {
    /// Feed the controller from `driver` on a sensor thread.
    ///
    /// Without a driver, readings are only produced through
    /// [`FarmSystem::reading_sender`].
    pub fn with_sensor(mut self, driver: Box<dyn SensorDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Route alerts to `handler` instead of tracing.
    pub fn with_alert_handler(mut self, handler: Arc<dyn AlertHandler>) -> Self {
        self.alert_handler = handler;
        self
    }

    /// Validate, acquire resources and spawn every task.
    ///
    /// # Errors
    /// Invalid configuration, driver initialization failure, log file open
    /// failure, or a thread that could not be spawned.
    pub fn start(self) -> ControlResult<FarmSystem> {
        let Self {
            config,
            driver,
            alert_handler,
        } = self;
        config.validate()?;

        let state = StateHandle::new(FarmState::with_thresholds(config.control.thresholds()));
        let (channel, readings_tx, readings_rx) = ReadingChannel::new();
        let (log_tx, log_rx) = log_channel(config.log.queue_capacity);
        let drop_counter = log_tx.drop_counter();

        let sensor = driver
            .map(|d| SensorLoop::new(d, &config.sensor, state.reader(), readings_tx.clone()))
            .transpose()?;
        let sink = LogSink::open(&config.log, log_rx).map_err(|source| ControlError::LogOpen {
            path: config.log.path.clone(),
            source,
        })?;

        let controller = Controller::new(
            state.clone(),
            readings_rx,
            log_tx,
            config.control.cycle(),
        );
        let monitor = AlertMonitor::new(
            state.reader(),
            AlertRules::from(&config.alert),
            config.alert.period(),
            alert_handler,
        );

        let coordinator = Arc::new(ShutdownCoordinator::new(state.clone(), channel));

        let spawned = (|| -> ControlResult<()> {
            coordinator.attach_log_sink(spawn_named("log sink", sink.spawn())?, drop_counter);
            coordinator.attach_controller(spawn_named("controller", controller.spawn())?);
            coordinator.attach_alert_monitor(spawn_named("alert monitor", monitor.spawn())?);
            if let Some(sensor) = sensor {
                coordinator.attach_sensor(spawn_named("sensor", sensor.spawn())?);
            }
            if config.actuator.enabled {
                let panel = ActuatorPanel::new(state.reader(), config.actuator.period());
                coordinator.attach_collaborator("actuator", spawn_named("actuator", panel.spawn())?);
            }
            Ok(())
        })();
        if let Err(e) = spawned {
            coordinator.stop();
            return Err(e);
        }

        info!(
            "Smart farm running: thresholds {}°C / {}%, cycle {:?}, log {:?}",
            config.control.temp_threshold,
            config.control.humidity_threshold,
            config.control.cycle(),
            config.log.path
        );

        Ok(FarmSystem {
            console: OperatorConsole::new(state.clone()),
            state,
            readings: readings_tx,
            coordinator,
        })
    }
}

fn spawn_named<T>(component: &'static str, result: io::Result<T>) -> ControlResult<T> {
    result.map_err(|source| ControlError::Spawn { component, source })
}

/// A running system.
pub struct FarmSystem {
    state: StateHandle,
    readings: ReadingSender,
    console: OperatorConsole,
    coordinator: Arc<ShutdownCoordinator>,
}

impl FarmSystem {
    /// Start configuring a system.
    pub fn builder(config: FarmConfig) -> FarmSystemBuilder {
        FarmSystemBuilder {
            config,
            driver: None,
            alert_handler: Arc::new(TracingAlertHandler),
        }
    }

    /// Shared state handle.
    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    /// Additional producer endpoint for the reading channel.
    pub fn reading_sender(&self) -> ReadingSender {
        self.readings.clone()
    }

    /// Threshold console.
    pub fn console(&self) -> &OperatorConsole {
        &self.console
    }

    /// Coordinator, shareable with a signal-handling thread.
    pub fn coordinator(&self) -> Arc<ShutdownCoordinator> {
        Arc::clone(&self.coordinator)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> ShutdownPhase {
        self.coordinator.phase()
    }

    /// Stop every task. Idempotent.
    pub fn stop(&self) -> ShutdownReport {
        self.coordinator.stop()
    }
}

impl Drop for FarmSystem {
    fn drop(&mut self) {
        // Never leave tasks running behind a dropped handle.
        self.coordinator.stop();
    }
}
