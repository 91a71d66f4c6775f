//! Control policy.
//!
//! ```text
//! heater_on = temperature < temp_threshold
//! fan_on    = humidity    > humidity_threshold
//! led_on    = true
//! ```
//!
//! A reading exactly at a threshold leaves that device off.

use farm_common::types::{DeviceStates, Reading, Thresholds};

/// Decide device outputs for one reading.
#[inline]
pub fn decide(reading: &Reading, thresholds: Thresholds) -> DeviceStates {
    DeviceStates {
        heater_on: reading.temperature < f64::from(thresholds.temp),
        fan_on: reading.humidity > f64::from(thresholds.humidity),
        led_on: true,
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
    fn warm_and_dry_turns_everything_off() {
        let d = decide(&Reading::now(30.0, 50.0), DEFAULTS);
        assert!(!d.heater_on);
        assert!(!d.fan_on);
        assert!(d.led_on);
    }

    #[test]
    fn cold_and_humid_turns_everything_on() {
        let d = decide(&Reading::now(26.0, 75.0), DEFAULTS);
        assert!(d.heater_on);
        assert!(d.fan_on);
    }

    #[test]
    fn threshold_equality_is_off() {
        let d = decide(&Reading::now(28.0, 70.0), DEFAULTS);
        assert!(!d.heater_on);
        assert!(!d.fan_on);
        assert!(d.led_on);
    }

    #[test]
    fn fractional_values_near_threshold() {
        let d = decide(&Reading::now(27.99, 70.01), DEFAULTS);
        assert!(d.heater_on);
        assert!(d.fan_on);
    }
}
