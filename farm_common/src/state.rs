//! Synchronized shared state.
//!
//! `FarmState` is the single record every component observes. It is only ever
//! reached through [`StateHandle::with_state`] (or the read-only
//! [`StateReader::with_state`]), which holds the lock for exactly the duration
//! of the closure. The closure's return type cannot borrow from the record, so
//! no component can keep a live reference outside a scoped access.
//!
//! ```rust
//! use farm_common::state::{FarmState, StateHandle};
//!
//! let state = StateHandle::new(FarmState::default());
//! state.with_state(|s| s.thresholds.temp = 24);
//! assert_eq!(state.with_state(|s| s.thresholds.temp), 24);
//! ```

use crate::consts::{
    DEFAULT_HUMIDITY_THRESHOLD, DEFAULT_TEMP_THRESHOLD, INITIAL_HUMIDITY, INITIAL_TEMP,
    RUN_FLAG_POLL_TIMEOUT,
};
use crate::types::{DeviceStates, Thresholds};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// The shared record.
///
/// Writers: the controller (devices, current readings), the operator console
/// (thresholds) and the shutdown coordinator (`running`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FarmState {
    /// Control thresholds.
    pub thresholds: Thresholds,
    /// Device outputs.
    pub devices: DeviceStates,
    /// Last processed temperature [°C].
    pub current_temp: f64,
    /// Last processed humidity [%].
    pub current_humidity: f64,
    /// `false` once a stop has been requested.
    pub running: bool,
}

impl Default for FarmState {
    fn default() -> Self {
        Self::with_thresholds(Thresholds {
            temp: DEFAULT_TEMP_THRESHOLD,
            humidity: DEFAULT_HUMIDITY_THRESHOLD,
        })
    }
}

impl FarmState {
    /// Startup state with the given thresholds: devices off except the LED.
    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            devices: DeviceStates {
                heater_on: false,
                fan_on: false,
                led_on: true,
            },
            current_temp: INITIAL_TEMP,
            current_humidity: INITIAL_HUMIDITY,
            running: true,
        }
    }
}

/// Read-write handle to the shared record. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StateHandle {
    inner: Arc<Mutex<FarmState>>,
}

impl StateHandle {
    /// Wrap an initial state.
    pub fn new(state: FarmState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Run `f` with exclusive access to the record and return its result.
    ///
    /// The lock is released when `f` returns or unwinds.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut FarmState) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    /// Like [`with_state`](Self::with_state), giving up after `timeout`.
    ///
    /// Returns `None` if the lock could not be acquired in time.
    pub fn try_with_state_for<R>(
        &self,
        timeout: Duration,
        f: impl FnOnce(&mut FarmState) -> R,
    ) -> Option<R> {
        let mut guard = self.inner.try_lock_for(timeout)?;
        Some(f(&mut guard))
    }

    /// Poll the run flag with a bounded wait.
    ///
    /// A poll that cannot get the lock within [`RUN_FLAG_POLL_TIMEOUT`] reports
    /// "still running"; the caller will see the real value on its next cycle.
    pub fn is_running(&self) -> bool {
        match self.try_with_state_for(RUN_FLAG_POLL_TIMEOUT, |s| s.running) {
            Some(running) => running,
            None => {
                trace!("run flag poll timed out, assuming running");
                true
            }
        }
    }

    /// Copy of the whole record taken in one scoped access.
    pub fn snapshot(&self) -> FarmState {
        self.with_state(|s| *s)
    }

    /// Read-only view for collaborators that must not write.
    pub fn reader(&self) -> StateReader {
        StateReader {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Read-only handle to the shared record.
#[derive(Debug, Clone)]
pub struct StateReader {
    inner: Arc<Mutex<FarmState>>,
}

impl StateReader {
    /// Run `f` with exclusive, read-only access to the record.
    pub fn with_state<R>(&self, f: impl FnOnce(&FarmState) -> R) -> R {
        let guard = self.inner.lock();
        f(&guard)
    }

    /// Poll the run flag with a bounded wait (see [`StateHandle::is_running`]).
    pub fn is_running(&self) -> bool {
        self.inner
            .try_lock_for(RUN_FLAG_POLL_TIMEOUT)
            .map(|s| s.running)
            .unwrap_or(true)
    }

    /// Copy of the whole record taken in one scoped access.
    pub fn snapshot(&self) -> FarmState {
        self.with_state(|s| *s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::thread;
    use std::time::Instant;

    #[test]
    fn default_state_matches_startup_values() {
        let state = FarmState::default();
        assert_eq!(state.thresholds.temp, 28);
        assert_eq!(state.thresholds.humidity, 70);
        assert!(!state.devices.heater_on);
        assert!(!state.devices.fan_on);
        assert!(state.devices.led_on);
        assert!(state.running);
    }

    #[test]
    fn with_state_returns_closure_result() {
        let handle = StateHandle::new(FarmState::default());
        let previous = handle.with_state(|s| {
            let old = s.thresholds.humidity;
            s.thresholds.humidity = 60;
            old
        });
        assert_eq!(previous, 70);
        assert_eq!(handle.snapshot().thresholds.humidity, 60);
    }

    #[test]
    fn lock_released_after_panic_in_closure() {
        let handle = StateHandle::new(FarmState::default());
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            handle.with_state(|s| {
                s.current_temp = 99.0;
                panic!("boom");
            })
        }));
        assert!(result.is_err());

        // Lock must be free again; no poisoning.
        let temp = handle
            .try_with_state_for(Duration::from_millis(100), |s| s.current_temp)
            .expect("lock should be free after unwind");
        assert_eq!(temp, 99.0);
    }

    #[test]
    fn run_flag_poll_is_bounded_while_lock_held() {
        let handle = StateHandle::new(FarmState::default());
        handle.with_state(|s| s.running = false);

        let holder = handle.clone();
        let (locked_tx, locked_rx) = crossbeam_channel::bounded(1);
        let t = thread::spawn(move || {
            holder.with_state(|_| {
                locked_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(400));
            });
        });
        locked_rx.recv().unwrap();

        let started = Instant::now();
        assert!(handle.is_running(), "timed-out poll reports still running");
        assert!(started.elapsed() < Duration::from_millis(300));

        t.join().unwrap();
        assert!(!handle.is_running());
    }

    #[test]
    fn reader_sees_writer_updates() {
        let handle = StateHandle::new(FarmState::default());
        let reader = handle.reader();
        handle.with_state(|s| s.devices.fan_on = true);
        assert!(reader.with_state(|s| s.devices.fan_on));
        assert!(reader.is_running());
    }
}
