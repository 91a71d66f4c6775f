//! Coordinated, idempotent shutdown.
//!
//! ```text
//! RUNNING ──stop()──▶ DRAINING ──────────────────────────────▶ STOPPED
//!                     1. running = false (one scoped write)
//!                     2. join alert monitor
//!                     3. join controller (it closes the log queue)
//!                     4. join log sink (drains queued records)
//!                     5. close reading channel, join sensor + collaborators
//! ```
//!
//! Every task observes the cleared run flag within one of its own periods, so
//! `stop` returns after at most the longest task period plus the log drain.
//! A task that panicked is reported in [`ShutdownReport::faulted`]; the rest
//! of the sequence still runs.

use crate::alert::AlertStats;
use crate::controller::CycleStats;
use crate::log_sink::{DropCounter, LogSinkStats};
use farm_common::channel::ReadingChannel;
use farm_common::state::StateHandle;
use farm_sim::SensorStats;
use parking_lot::Mutex;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    /// Tasks running.
    Running,
    /// Stop requested; waiting for tasks to exit.
    Draining,
    /// Every task joined.
    Stopped,
}

/// Final statistics gathered while stopping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShutdownReport {
    /// Controller cycle statistics.
    pub controller: Option<CycleStats>,
    /// Decision log writer statistics.
    pub log: Option<LogSinkStats>,
    /// Records evicted from the decision-log queue.
    pub log_dropped: u64,
    /// Alert monitor statistics.
    pub alerts: Option<AlertStats>,
    /// Sensor loop statistics.
    pub sensor: Option<SensorStats>,
    /// Collaborator threads joined cleanly.
    pub collaborators: usize,
    /// Tasks that panicked.
    pub faulted: Vec<&'static str>,
    /// Time spent draining.
    pub elapsed: Duration,
}

impl ShutdownReport {
    /// No task panicked.
    pub fn is_clean(&self) -> bool {
        self.faulted.is_empty()
    }
}

#[derive(Default)]
struct Tasks {
    alert: Option<JoinHandle<AlertStats>>,
    controller: Option<JoinHandle<CycleStats>>,
    log_sink: Option<JoinHandle<LogSinkStats>>,
    log_dropped: Option<DropCounter>,
    sensor: Option<JoinHandle<SensorStats>>,
    collaborators: Vec<(&'static str, JoinHandle<()>)>,
}

struct Inner {
    phase: ShutdownPhase,
    tasks: Tasks,
}

/// Owns the task handles and runs the stop sequence once.
///
/// `inner` is only held for short bookkeeping, never across a join, so
/// [`phase`](Self::phase) answers immediately while a drain is in progress.
/// `report` is held for the whole stop sequence and serializes callers.
pub struct ShutdownCoordinator {
    state: StateHandle,
    readings: ReadingChannel,
    inner: Mutex<Inner>,
    report: Mutex<Option<ShutdownReport>>,
}

impl ShutdownCoordinator {
    /// Coordinator for tasks sharing `state` and fed through `readings`.
    pub fn new(state: StateHandle, readings: ReadingChannel) -> Self {
        Self {
            state,
            readings,
            inner: Mutex::new(Inner {
                phase: ShutdownPhase::Running,
                tasks: Tasks::default(),
            }),
            report: Mutex::new(None),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> ShutdownPhase {
        self.inner.lock().phase
    }

    /// Register the alert monitor thread.
    pub fn attach_alert_monitor(&self, handle: JoinHandle<AlertStats>) {
        self.with_tasks("alert monitor", |t| t.alert = Some(handle));
    }

    /// Register the controller thread.
    pub fn attach_controller(&self, handle: JoinHandle<CycleStats>) {
        self.with_tasks("controller", |t| t.controller = Some(handle));
    }

    /// Register the log sink thread and its queue's eviction counter.
    ///
    /// The sink only exits once its enqueue side is dropped, which the
    /// controller does on stop; attach a sink only together with the
    /// controller that owns its sender.
    pub fn attach_log_sink(&self, handle: JoinHandle<LogSinkStats>, dropped: DropCounter) {
        self.with_tasks("log sink", |t| {
            t.log_sink = Some(handle);
            t.log_dropped = Some(dropped);
        });
    }

    /// Register the sensor loop thread.
    pub fn attach_sensor(&self, handle: JoinHandle<SensorStats>) {
        self.with_tasks("sensor", |t| t.sensor = Some(handle));
    }

    /// Register a collaborator thread that exits on the run flag.
    pub fn attach_collaborator(&self, name: &'static str, handle: JoinHandle<()>) {
        self.with_tasks(name, |t| t.collaborators.push((name, handle)));
    }

    fn with_tasks(&self, name: &'static str, f: impl FnOnce(&mut Tasks)) {
        let mut inner = self.inner.lock();
        if inner.phase != ShutdownPhase::Running {
            // The flag is already cleared; the thread exits on its own.
            warn!("{} attached after shutdown, detaching", name);
            return;
        }
        f(&mut inner.tasks);
    }

    /// Stop every task and return the final report.
    ///
    /// Idempotent: later calls (from any thread) wait for the first to finish
    /// and return the same report.
    pub fn stop(&self) -> ShutdownReport {
        let mut slot = self.report.lock();
        if let Some(report) = slot.as_ref() {
            debug!("Shutdown already completed");
            return report.clone();
        }

        let started = Instant::now();
        info!("Shutdown requested, draining tasks");
        let mut tasks = {
            let mut inner = self.inner.lock();
            inner.phase = ShutdownPhase::Draining;
            std::mem::take(&mut inner.tasks)
        };
        self.state.with_state(|s| s.running = false);

        let mut report = ShutdownReport::default();
        report.alerts = join("alert monitor", tasks.alert.take(), &mut report.faulted);
        report.controller = join("controller", tasks.controller.take(), &mut report.faulted);
        report.log = join("log sink", tasks.log_sink.take(), &mut report.faulted);
        report.log_dropped = tasks.log_dropped.as_ref().map_or(0, DropCounter::get);

        self.readings.close();
        report.sensor = join("sensor", tasks.sensor.take(), &mut report.faulted);
        for (name, handle) in tasks.collaborators.drain(..) {
            if join(name, Some(handle), &mut report.faulted).is_some() {
                report.collaborators += 1;
            }
        }

        report.elapsed = started.elapsed();
        self.inner.lock().phase = ShutdownPhase::Stopped;
        *slot = Some(report.clone());
        info!("Shutdown complete in {:?}", report.elapsed);
        report
    }
}

fn join<T>(
    name: &'static str,
    handle: Option<JoinHandle<T>>,
    faulted: &mut Vec<&'static str>,
) -> Option<T> {
    let handle = handle?;
    match handle.join() {
        Ok(value) => {
            debug!("{} joined", name);
            Some(value)
        }
        Err(_) => {
            error!("{} thread panicked", name);
            faulted.push(name);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farm_common::state::FarmState;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn stop_without_tasks_is_idempotent() {
        let state = StateHandle::new(FarmState::default());
        let (channel, tx, _rx) = ReadingChannel::new();
        let coordinator = ShutdownCoordinator::new(state.clone(), channel);
        assert_eq!(coordinator.phase(), ShutdownPhase::Running);

        let first = coordinator.stop();
        assert_eq!(coordinator.phase(), ShutdownPhase::Stopped);
        assert!(!state.is_running());
        assert!(tx.is_closed());

        let second = coordinator.stop();
        assert_eq!(first, second);
    }

    #[test]
    fn panicking_collaborator_is_reported() {
        let state = StateHandle::new(FarmState::default());
        let (channel, _tx, _rx) = ReadingChannel::new();
        let coordinator = ShutdownCoordinator::new(state, channel);
        let handle = thread::spawn(|| panic!("collaborator failure"));
        coordinator.attach_collaborator("faulty", handle);

        let report = coordinator.stop();
        assert_eq!(report.faulted, vec!["faulty"]);
        assert!(!report.is_clean());
        assert_eq!(report.collaborators, 0);
    }

    #[test]
    fn phase_reports_draining_while_tasks_exit() {
        let state = StateHandle::new(FarmState::default());
        let (channel, _tx, _rx) = ReadingChannel::new();
        let coordinator = Arc::new(ShutdownCoordinator::new(state.clone(), channel));

        let reader = state.reader();
        let slow = thread::spawn(move || {
            while reader.is_running() {
                thread::sleep(Duration::from_millis(2));
            }
            // Still busy after seeing the cleared flag.
            thread::sleep(Duration::from_millis(300));
        });
        coordinator.attach_collaborator("slow", slow);

        let stopper = {
            let coordinator = Arc::clone(&coordinator);
            thread::spawn(move || coordinator.stop())
        };

        let deadline = Instant::now() + Duration::from_millis(250);
        let mut seen_draining = false;
        while Instant::now() < deadline {
            let asked = Instant::now();
            let phase = coordinator.phase();
            assert!(asked.elapsed() < Duration::from_millis(50), "phase() blocked");
            if phase == ShutdownPhase::Draining {
                seen_draining = true;
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        assert!(seen_draining);

        // Attaching during the drain does not block either.
        let asked = Instant::now();
        coordinator.attach_collaborator("late", thread::spawn(|| {}));
        assert!(asked.elapsed() < Duration::from_millis(50));

        let report = stopper.join().unwrap();
        assert_eq!(report.collaborators, 1);
        assert_eq!(coordinator.phase(), ShutdownPhase::Stopped);
    }
}
