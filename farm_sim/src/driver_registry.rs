//! Sensor driver selection by name.
//!
//! The `[sensor] driver` key names one entry of a [`DriverRegistry`]. The
//! registry is built once at startup, seeded from the built-in table and
//! optionally extended by the embedding binary; there is no global state.
//! Lookup order is registration order, so `names()` is stable for messages.

use crate::driver::{DriverError, DriverFactory, SensorDriver};
use crate::simulation;
use farm_common::config::SensorConfig;
use tracing::debug;

/// Drivers shipped with this crate.
const BUILTIN: &[(&str, DriverFactory)] = &[("simulation", simulation::create_driver)];

/// Named sensor driver factories.
pub struct DriverRegistry {
    entries: Vec<(&'static str, DriverFactory)>,
}

impl DriverRegistry {
    /// Registry with no drivers.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registry holding the built-in drivers.
    pub fn with_builtin() -> Self {
        Self {
            entries: BUILTIN.to_vec(),
        }
    }

    /// Add a driver under `name`.
    ///
    /// # Errors
    /// `DriverError::DuplicateDriver` if the name is taken; the existing
    /// entry is kept.
    pub fn register(
        &mut self,
        name: &'static str,
        factory: DriverFactory,
    ) -> Result<(), DriverError> {
        if self.contains(name) {
            return Err(DriverError::DuplicateDriver(name.to_string()));
        }
        self.entries.push((name, factory));
        Ok(())
    }

    /// Whether a driver is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| *n == name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(n, _)| *n).collect()
    }

    /// Instantiate the driver named by `config.driver`.
    ///
    /// The driver is returned uninitialized; `SensorLoop::new` runs `init`.
    ///
    /// # Errors
    /// `DriverError::DriverNotFound` listing the registered names.
    pub fn create(&self, config: &SensorConfig) -> Result<Box<dyn SensorDriver>, DriverError> {
        let name = config.driver.trim();
        let (_, factory) = self
            .entries
            .iter()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| DriverError::DriverNotFound {
                name: name.to_string(),
                available: self.names().join(", "),
            })?;
        debug!("Selected sensor driver '{}'", name);
        Ok(factory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farm_common::types::{DeviceStates, Reading};
    use std::time::Duration;

    struct FixedDriver;

    impl SensorDriver for FixedDriver {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn version(&self) -> &'static str {
            "0.1.0"
        }

        fn init(&mut self, _config: &SensorConfig) -> Result<(), DriverError> {
            Ok(())
        }

        fn sample(&mut self, _devices: DeviceStates, _dt: Duration) -> Reading {
            Reading::now(25.0, 50.0)
        }

        fn shutdown(&mut self) -> Result<(), DriverError> {
            Ok(())
        }
    }

    fn fixed() -> Box<dyn SensorDriver> {
        Box::new(FixedDriver)
    }

    fn sensor_config(driver: &str) -> SensorConfig {
        SensorConfig {
            driver: driver.to_string(),
            ..SensorConfig::default()
        }
    }

    #[test]
    fn default_config_selects_simulation() {
        let registry = DriverRegistry::with_builtin();
        let driver = registry.create(&SensorConfig::default()).unwrap();
        assert_eq!(driver.name(), "simulation");
    }

    #[test]
    fn registered_driver_is_selectable_after_builtins() {
        let mut registry = DriverRegistry::with_builtin();
        registry.register("fixed", fixed).unwrap();
        assert_eq!(registry.names(), vec!["simulation", "fixed"]);
        let driver = registry.create(&sensor_config(" fixed ")).unwrap();
        assert_eq!(driver.name(), "fixed");
    }

    #[test]
    fn duplicate_name_is_rejected_and_original_kept() {
        let mut registry = DriverRegistry::with_builtin();
        let err = registry.register("simulation", fixed).unwrap_err();
        assert!(matches!(err, DriverError::DuplicateDriver(ref n) if n == "simulation"));
        assert_eq!(registry.names(), vec!["simulation"]);
        let driver = registry.create(&SensorConfig::default()).unwrap();
        assert_eq!(driver.name(), "simulation");
    }

    #[test]
    fn unknown_driver_error_lists_available_names() {
        let mut registry = DriverRegistry::empty();
        registry.register("fixed", fixed).unwrap();
        let err = registry.create(&sensor_config("dht22")).err().unwrap();
        match &err {
            DriverError::DriverNotFound { name, available } => {
                assert_eq!(name, "dht22");
                assert_eq!(available, "fixed");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("dht22"));
    }

    #[test]
    fn empty_registry_has_nothing_to_create() {
        let registry = DriverRegistry::empty();
        assert!(!registry.contains("simulation"));
        assert!(registry.create(&SensorConfig::default()).is_err());
    }
}
