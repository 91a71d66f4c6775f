//! Sensor loop integration tests.
//!
//! Drives `SensorLoop` against a real shared state and reading channel:
//! send cadence, reaction to device outputs, and both stop paths.

use farm_common::config::SensorConfig;
use farm_common::prelude::*;
use farm_sim::{DriverError, SensorDriver, SensorLoop, SimulationDriver};
use std::thread;
use std::time::Duration;

/// Driver emitting 1.0, 2.0, 3.0, ... so order and cadence are visible.
struct CountingDriver {
    next: f64,
}

impl SensorDriver for CountingDriver {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn version(&self) -> &'static str {
        "0.0.1"
    }

    fn init(&mut self, _config: &SensorConfig) -> Result<(), DriverError> {
        self.next = 1.0;
        Ok(())
    }

    fn sample(&mut self, devices: DeviceStates, _dt: Duration) -> Reading {
        let value = self.next;
        self.next += 1.0;
        Reading::now(value, if devices.fan_on { 1.0 } else { 0.0 })
    }

    fn shutdown(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}

fn fast_config(send_every: u32) -> SensorConfig {
    SensorConfig {
        tick_ms: 5,
        send_every,
        ..SensorConfig::default()
    }
}

#[test]
fn sends_every_nth_tick_in_order_and_stops_on_run_flag() {
    let state = StateHandle::new(FarmState::default());
    let (_channel, tx, rx) = ReadingChannel::new();
    let sensor = SensorLoop::new(
        Box::new(CountingDriver { next: 0.0 }),
        &fast_config(2),
        state.reader(),
        tx,
    )
    .unwrap();
    let handle = sensor.spawn().unwrap();

    thread::sleep(Duration::from_millis(100));
    state.with_state(|s| s.running = false);
    let stats = handle.join().unwrap();

    assert!(stats.ticks >= 2);
    assert_eq!(stats.sent, stats.ticks.div_ceil(2));

    let mut expected = 1.0;
    while let Some(reading) = rx.poll() {
        assert_eq!(reading.temperature, expected);
        expected += 2.0;
    }
    assert!(expected > 1.0, "at least one reading was delivered");
}

#[test]
fn sample_sees_current_device_outputs() {
    let state = StateHandle::new(FarmState::default());
    state.with_state(|s| s.devices.fan_on = true);
    let (_channel, tx, rx) = ReadingChannel::new();
    let sensor = SensorLoop::new(
        Box::new(CountingDriver { next: 0.0 }),
        &fast_config(1),
        state.reader(),
        tx,
    )
    .unwrap();
    let handle = sensor.spawn().unwrap();

    thread::sleep(Duration::from_millis(30));
    state.with_state(|s| s.running = false);
    handle.join().unwrap();

    let first = rx.poll().expect("reading");
    assert_eq!(first.humidity, 1.0);
}

#[test]
fn closed_channel_stops_the_loop() {
    let state = StateHandle::new(FarmState::default());
    let (channel, tx, _rx) = ReadingChannel::new();
    let sensor = SensorLoop::new(
        Box::new(SimulationDriver::with_seed(11)),
        &fast_config(1),
        state.reader(),
        tx,
    )
    .unwrap();
    let handle = sensor.spawn().unwrap();

    thread::sleep(Duration::from_millis(20));
    channel.close();
    let stats = handle.join().unwrap();
    assert!(state.is_running(), "loop exited without a stop request");
    assert!(stats.ticks >= 1);
}
