//! Climate model for the simulated greenhouse.
//!
//! Temperature and humidity evolve once per sensor tick:
//!
//! | Device | ON                         | OFF                                   |
//! |--------|----------------------------|---------------------------------------|
//! | heater | `+0.2 °C`, capped at 40 °C | `T -= (T - 25) * 0.05`, floor 20 °C    |
//! | fan    | `-0.5 %`, floor 30 %       | `+0.3 %`, capped at 90 %              |
//!
//! A uniform jitter in `±0.10` is then added to both values, so the result
//! may sit marginally outside the clamp range.
//!
//! [`ClimateModel::advance`] applies a fraction or multiple of a tick: rates
//! scale linearly with the tick count and the cooling factor is capped at 1,
//! so a late sample never overshoots ambient. Jitter is added once per sample.

use rand::Rng;

/// Rates and limits of the climate model (per tick).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateParams {
    /// Heating rate while the heater is on [°C/tick].
    pub heat_rate: f64,
    /// Maximum temperature reachable by heating [°C].
    pub max_temp: f64,
    /// Ambient temperature the room relaxes to [°C].
    pub ambient_temp: f64,
    /// Newtonian cooling coefficient [1/tick].
    pub cooling_coeff: f64,
    /// Minimum temperature reachable by cooling [°C].
    pub min_temp: f64,
    /// Drying rate while the fan is on [%/tick].
    pub dry_rate: f64,
    /// Minimum humidity [%].
    pub min_humidity: f64,
    /// Evaporation rate while the fan is off [%/tick].
    pub evaporation_rate: f64,
    /// Maximum humidity [%].
    pub max_humidity: f64,
    /// Jitter amplitude applied to both values.
    pub jitter: f64,
}

impl Default for ClimateParams {
    fn default() -> Self {
        Self {
            heat_rate: 0.2,
            max_temp: 40.0,
            ambient_temp: 25.0,
            cooling_coeff: 0.05,
            min_temp: 20.0,
            dry_rate: 0.5,
            min_humidity: 30.0,
            evaporation_rate: 0.3,
            max_humidity: 90.0,
            jitter: 0.10,
        }
    }
}

/// Current simulated temperature and humidity.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateModel {
    temperature: f64,
    humidity: f64,
    params: ClimateParams,
}

impl ClimateModel {
    /// Model starting at the given conditions.
    pub fn new(temperature: f64, humidity: f64, params: ClimateParams) -> Self {
        Self {
            temperature,
            humidity,
            params,
        }
    }

    /// Current temperature [°C].
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Current humidity [%].
    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    /// Model parameters.
    pub fn params(&self) -> &ClimateParams {
        &self.params
    }

    /// Advance one tick without noise.
    pub fn step_deterministic(&mut self, heater_on: bool, fan_on: bool) {
        self.advance(heater_on, fan_on, 1.0);
    }

    /// Advance `ticks` (possibly fractional) ticks without noise.
    pub fn advance(&mut self, heater_on: bool, fan_on: bool, ticks: f64) {
        let p = &self.params;
        let ticks = ticks.max(0.0);

        if heater_on {
            self.temperature = (self.temperature + p.heat_rate * ticks).min(p.max_temp);
        } else {
            let k = (p.cooling_coeff * ticks).min(1.0);
            self.temperature -= (self.temperature - p.ambient_temp) * k;
            self.temperature = self.temperature.max(p.min_temp);
        }

        if fan_on {
            self.humidity = (self.humidity - p.dry_rate * ticks).max(p.min_humidity);
        } else {
            self.humidity = (self.humidity + p.evaporation_rate * ticks).min(p.max_humidity);
        }
    }

    /// Advance one tick and add jitter drawn from `rng`.
    pub fn step<R: Rng + ?Sized>(&mut self, heater_on: bool, fan_on: bool, rng: &mut R) {
        self.advance_noisy(heater_on, fan_on, 1.0, rng);
    }

    /// Advance `ticks` ticks, then add one draw of jitter from `rng`.
    pub fn advance_noisy<R: Rng + ?Sized>(
        &mut self,
        heater_on: bool,
        fan_on: bool,
        ticks: f64,
        rng: &mut R,
    ) {
        self.advance(heater_on, fan_on, ticks);
        let jitter = self.params.jitter;
        if jitter > 0.0 {
            self.temperature += rng.gen_range(-jitter..=jitter);
            self.humidity += rng.gen_range(-jitter..=jitter);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn model(temp: f64, humidity: f64) -> ClimateModel {
        ClimateModel::new(temp, humidity, ClimateParams::default())
    }

    #[test]
    fn heater_on_raises_temperature_until_cap() {
        let mut m = model(39.9, 50.0);
        m.step_deterministic(true, false);
        assert!((m.temperature() - 40.0).abs() < 1e-9);
        m.step_deterministic(true, false);
        assert!((m.temperature() - 40.0).abs() < 1e-9);

        let mut m = model(25.0, 50.0);
        m.step_deterministic(true, false);
        assert!((m.temperature() - 25.2).abs() < 1e-9);
    }

    #[test]
    fn heater_off_decays_toward_ambient() {
        let mut m = model(35.0, 50.0);
        m.step_deterministic(false, false);
        assert!((m.temperature() - 34.5).abs() < 1e-9);
        for _ in 0..500 {
            m.step_deterministic(false, false);
        }
        assert!((m.temperature() - 25.0).abs() < 1e-3);
    }

    #[test]
    fn cooling_never_drops_below_floor() {
        let mut m = model(19.0, 50.0);
        m.step_deterministic(false, false);
        assert!(m.temperature() >= 20.0);
    }

    #[test]
    fn fan_drives_humidity_between_limits() {
        let mut m = model(25.0, 30.2);
        m.step_deterministic(false, true);
        assert!((m.humidity() - 30.0).abs() < 1e-9);

        let mut m = model(25.0, 89.9);
        m.step_deterministic(false, false);
        assert!((m.humidity() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn fractional_ticks_scale_the_rates() {
        let mut half = model(25.0, 50.0);
        half.advance(true, true, 0.5);
        assert!((half.temperature() - 25.1).abs() < 1e-9);
        assert!((half.humidity() - 49.75).abs() < 1e-9);

        let mut idle = model(30.0, 50.0);
        idle.advance(false, false, 0.0);
        assert_eq!(idle, model(30.0, 50.0));
    }

    #[test]
    fn long_gap_cools_to_ambient_without_overshoot() {
        let mut m = model(35.0, 50.0);
        m.advance(false, false, 100.0);
        assert!((m.temperature() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn seeded_jitter_is_reproducible() {
        let mut a = model(25.0, 50.0);
        let mut b = model(25.0, 50.0);
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            a.step(true, true, &mut rng_a);
            b.step(true, true, &mut rng_b);
        }
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn jitter_is_bounded(
            temp in 20.0f64..40.0,
            humidity in 30.0f64..90.0,
            heater in any::<bool>(),
            fan in any::<bool>(),
            seed in any::<u64>(),
        ) {
            let mut noisy = model(temp, humidity);
            let mut clean = model(temp, humidity);
            let mut rng = StdRng::seed_from_u64(seed);
            noisy.step(heater, fan, &mut rng);
            clean.step_deterministic(heater, fan);
            prop_assert!((noisy.temperature() - clean.temperature()).abs() <= 0.10 + 1e-9);
            prop_assert!((noisy.humidity() - clean.humidity()).abs() <= 0.10 + 1e-9);
        }
    }
}
