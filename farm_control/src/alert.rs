//! Periodic alert monitor.
//!
//! Every tick the monitor reads the last processed temperature/humidity and
//! the current thresholds in one scoped access and evaluates three rules:
//!
//! | Alert          | Condition                                 |
//! |----------------|-------------------------------------------|
//! | high temp      | `current_temp > temp_threshold + 5`       |
//! | low temp       | `current_temp < 20.0`                     |
//! | high humidity  | `current_humidity > humidity_threshold + 10` |
//!
//! Alerts are stateless: a persisting condition fires again on every tick.

use bitflags::bitflags;
use farm_common::config::AlertConfig;
use farm_common::state::StateReader;
use farm_common::types::Thresholds;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{info, warn};

bitflags! {
    /// Set of alert conditions active at one tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AlertSet: u8 {
        /// Temperature above threshold + margin.
        const HIGH_TEMPERATURE = 1 << 0;
        /// Temperature below the absolute floor.
        const LOW_TEMPERATURE  = 1 << 1;
        /// Humidity above threshold + margin.
        const HIGH_HUMIDITY    = 1 << 2;
    }
}

/// Single alert condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// Temperature above threshold + margin.
    HighTemperature,
    /// Temperature below the absolute floor.
    LowTemperature,
    /// Humidity above threshold + margin.
    HighHumidity,
}

impl AlertKind {
    /// Flag of this kind in an [`AlertSet`].
    pub const fn flag(self) -> AlertSet {
        match self {
            Self::HighTemperature => AlertSet::HIGH_TEMPERATURE,
            Self::LowTemperature => AlertSet::LOW_TEMPERATURE,
            Self::HighHumidity => AlertSet::HIGH_HUMIDITY,
        }
    }
}

/// One raised alert with the value that triggered it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alert {
    /// Condition.
    pub kind: AlertKind,
    /// Observed value [°C or %].
    pub value: f64,
    /// Limit that was crossed.
    pub limit: f64,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AlertKind::HighTemperature => write!(
                f,
                "high temperature {:.1}°C (limit {:.1}°C)",
                self.value, self.limit
            ),
            AlertKind::LowTemperature => write!(
                f,
                "low temperature {:.1}°C (floor {:.1}°C)",
                self.value, self.limit
            ),
            AlertKind::HighHumidity => write!(
                f,
                "high humidity {:.1}% (limit {:.1}%)",
                self.value, self.limit
            ),
        }
    }
}

/// Alert thresholds relative to the control thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertRules {
    /// Added to the temperature threshold [°C].
    pub high_temp_margin: i32,
    /// Absolute low-temperature floor [°C].
    pub low_temp_floor: f64,
    /// Added to the humidity threshold [%].
    pub high_humidity_margin: i32,
}

impl Default for AlertRules {
    fn default() -> Self {
        Self::from(&AlertConfig::default())
    }
}

impl From<&AlertConfig> for AlertRules {
    fn from(config: &AlertConfig) -> Self {
        Self {
            high_temp_margin: config.high_temp_margin,
            low_temp_floor: config.low_temp_floor,
            high_humidity_margin: config.high_humidity_margin,
        }
    }
}

impl AlertRules {
    /// Alerts raised by one observation, in kind order.
    pub fn evaluate(&self, temp: f64, humidity: f64, thresholds: Thresholds) -> Vec<Alert> {
        let high_temp = f64::from(thresholds.temp) + f64::from(self.high_temp_margin);
        let high_humidity = f64::from(thresholds.humidity) + f64::from(self.high_humidity_margin);

        let mut alerts = Vec::new();
        if temp > high_temp {
            alerts.push(Alert {
                kind: AlertKind::HighTemperature,
                value: temp,
                limit: high_temp,
            });
        }
        if temp < self.low_temp_floor {
            alerts.push(Alert {
                kind: AlertKind::LowTemperature,
                value: temp,
                limit: self.low_temp_floor,
            });
        }
        if humidity > high_humidity {
            alerts.push(Alert {
                kind: AlertKind::HighHumidity,
                value: humidity,
                limit: high_humidity,
            });
        }
        alerts
    }

    /// Flags of [`evaluate`](Self::evaluate).
    pub fn active(&self, temp: f64, humidity: f64, thresholds: Thresholds) -> AlertSet {
        self.evaluate(temp, humidity, thresholds)
            .iter()
            .fold(AlertSet::empty(), |set, alert| set | alert.kind.flag())
    }
}

/// Receives raised alerts.
pub trait AlertHandler: Send + Sync {
    /// Called once per alert per tick.
    fn raise(&self, alert: &Alert);
}

/// Handler emitting each alert as a `warn!` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertHandler;

impl AlertHandler for TracingAlertHandler {
    fn raise(&self, alert: &Alert) {
        warn!("[ALERT] {}", alert);
    }
}

/// Counters reported when the monitor exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertStats {
    /// Ticks evaluated.
    pub ticks: u64,
    /// Alerts raised.
    pub raised: u64,
}

/// The alert monitor task.
pub struct AlertMonitor {
    state: StateReader,
    rules: AlertRules,
    period: Duration,
    handler: Arc<dyn AlertHandler>,
    stats: AlertStats,
}

impl AlertMonitor {
    /// Monitor evaluating `rules` every `period`.
    pub fn new(
        state: StateReader,
        rules: AlertRules,
        period: Duration,
        handler: Arc<dyn AlertHandler>,
    ) -> Self {
        Self {
            state,
            rules,
            period,
            handler,
            stats: AlertStats::default(),
        }
    }

    /// Evaluate one tick and hand every alert to the handler.
    pub fn tick(&mut self) -> AlertSet {
        let (temp, humidity, thresholds) = self
            .state
            .with_state(|s| (s.current_temp, s.current_humidity, s.thresholds));
        let alerts = self.rules.evaluate(temp, humidity, thresholds);
        let mut set = AlertSet::empty();
        for alert in &alerts {
            self.handler.raise(alert);
            set |= alert.kind.flag();
        }
        self.stats.ticks += 1;
        self.stats.raised += alerts.len() as u64;
        set
    }

    /// Tick until the run flag is found cleared at the start of a tick.
    pub fn run(mut self) -> AlertStats {
        info!("Alert monitor running (period {:?})", self.period);
        while self.state.is_running() {
            self.tick();
            thread::sleep(self.period);
        }
        info!(
            "Alert monitor stopped after {} ticks ({} alerts)",
            self.stats.ticks, self.stats.raised
        );
        self.stats
    }

    /// Run on a dedicated thread named `alert-monitor`.
    pub fn spawn(self) -> io::Result<JoinHandle<AlertStats>> {
        thread::Builder::new()
            .name("alert-monitor".to_string())
            .spawn(move || self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: Thresholds = Thresholds {
        temp: 28,
        humidity: 70,
    };

    #[test]
    fn high_temperature_fires_above_margin() {
        let set = AlertRules::default().active(34.0, 50.0, DEFAULTS);
        assert_eq!(set, AlertSet::HIGH_TEMPERATURE);
    }

    #[test]
    fn high_temperature_silent_within_margin() {
        assert!(AlertRules::default().active(32.0, 50.0, DEFAULTS).is_empty());
        // Exactly threshold + margin is not an alert.
        assert!(AlertRules::default().active(33.0, 50.0, DEFAULTS).is_empty());
    }

    #[test]
    fn low_temperature_uses_absolute_floor() {
        let rules = AlertRules::default();
        assert_eq!(rules.active(19.0, 50.0, DEFAULTS), AlertSet::LOW_TEMPERATURE);
        assert!(rules.active(20.0, 50.0, DEFAULTS).is_empty());
        let cold = Thresholds {
            temp: 10,
            humidity: 70,
        };
        assert_eq!(rules.active(19.0, 50.0, cold), AlertSet::LOW_TEMPERATURE);
    }

    #[test]
    fn high_humidity_fires_above_margin() {
        let rules = AlertRules::default();
        assert_eq!(rules.active(25.0, 80.5, DEFAULTS), AlertSet::HIGH_HUMIDITY);
        assert!(rules.active(25.0, 80.0, DEFAULTS).is_empty());
    }

    #[test]
    fn alert_display_mentions_value_and_limit() {
        let alert = AlertRules::default().evaluate(34.0, 50.0, DEFAULTS)[0];
        let text = alert.to_string();
        assert!(text.contains("34.0"));
        assert!(text.contains("33.0"));
    }
}
