//! Control loop: reading channel → policy → shared state → decision log.
//!
//! One cycle per period (1 s by default):
//! 1. Check the run flag; if cleared, close the decision-log queue and stop.
//! 2. Poll the reading channel without blocking.
//! 3. For a reading: read thresholds, decide, and write device outputs plus
//!    the raw reading in a single scoped access, then enqueue a log record.
//!
//! At most one reading is consumed per cycle, so a backlog is worked off in
//! FIFO order one period at a time.

use crate::log_sink::{Enqueued, LogSender};
use crate::policy::decide;
use farm_common::channel::ReadingReceiver;
use farm_common::state::StateHandle;
use farm_common::types::{DeviceStates, LogRecord, Reading};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// Per-cycle counters and timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Cycles that processed a reading.
    pub processed: u64,
    /// Cycles that found the channel empty.
    pub idle: u64,
    /// Cycles whose body exceeded the period.
    pub overruns: u64,
    /// Log records evicted to make room for this controller's records.
    pub log_dropped: u64,
    /// Maximum cycle body duration [ns].
    pub max_cycle_ns: u64,
    /// Running sum for average computation.
    pub sum_cycle_ns: u64,
}

impl CycleStats {
    /// Zeroed stats.
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            processed: 0,
            idle: 0,
            overruns: 0,
            log_dropped: 0,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
        }
    }

    /// Record one cycle body duration.
    #[inline]
    pub fn record(&mut self, outcome: &CycleOutcome, duration: Duration, period: Duration) {
        let ns = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.cycle_count += 1;
        match outcome {
            CycleOutcome::Processed(_) => self.processed += 1,
            CycleOutcome::Idle => self.idle += 1,
            CycleOutcome::Stopped => {}
        }
        if duration > period {
            self.overruns += 1;
        }
        self.max_cycle_ns = self.max_cycle_ns.max(ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(ns);
    }

    /// Average cycle body duration [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> u64 {
        self.sum_cycle_ns.checked_div(self.cycle_count).unwrap_or(0)
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

/// What one call to [`Controller::run_cycle`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A reading was consumed and these outputs applied.
    Processed(DeviceStates),
    /// No reading was waiting.
    Idle,
    /// The run flag was cleared; the log queue has been closed.
    Stopped,
}

/// The controller task.
pub struct Controller {
    state: StateHandle,
    readings: ReadingReceiver,
    log: Option<LogSender>,
    period: Duration,
    stats: CycleStats,
}

impl Controller {
    /// Controller consuming `readings` and feeding `log` every `period`.
    pub fn new(
        state: StateHandle,
        readings: ReadingReceiver,
        log: LogSender,
        period: Duration,
    ) -> Self {
        Self {
            state,
            readings,
            log: Some(log),
            period,
            stats: CycleStats::new(),
        }
    }

    /// Statistics so far.
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Execute one cycle body (no sleeping).
    pub fn run_cycle(&mut self) -> CycleOutcome {
        if !self.state.is_running() {
            self.close_log();
            return CycleOutcome::Stopped;
        }
        match self.readings.poll() {
            Some(reading) => CycleOutcome::Processed(self.apply(&reading)),
            None => CycleOutcome::Idle,
        }
    }

    fn apply(&mut self, reading: &Reading) -> DeviceStates {
        let (devices, thresholds) = self.state.with_state(|s| {
            let devices = decide(reading, s.thresholds);
            s.devices = devices;
            s.current_temp = reading.temperature;
            s.current_humidity = reading.humidity;
            (devices, s.thresholds)
        });

        info!(
            "Reading {:.2}°C {:.2}% (thresholds {}°C / {}%) -> heater {}, fan {}",
            reading.temperature,
            reading.humidity,
            thresholds.temp,
            thresholds.humidity,
            if devices.heater_on { "ON" } else { "OFF" },
            if devices.fan_on { "ON" } else { "OFF" }
        );

        if let Some(log) = &self.log {
            match log.enqueue(LogRecord::new(reading, devices)) {
                Enqueued::Queued => {}
                Enqueued::DroppedOldest => {
                    self.stats.log_dropped += 1;
                    debug!("Decision log queue full, oldest record dropped");
                }
                Enqueued::Closed => warn!("Decision log sink is gone, record discarded"),
            }
        }
        devices
    }

    /// Drop the enqueue side so the sink drains and exits.
    fn close_log(&mut self) {
        if self.log.take().is_some() {
            debug!("Controller closed the decision log queue");
        }
    }

    /// Cycle until stopped, sleeping out the remainder of each period.
    pub fn run(mut self) -> CycleStats {
        info!("Controller running (period {:?})", self.period);
        loop {
            let start = Instant::now();
            let outcome = self.run_cycle();
            if outcome == CycleOutcome::Stopped {
                break;
            }
            let elapsed = start.elapsed();
            self.stats.record(&outcome, elapsed, self.period);
            if elapsed < self.period {
                thread::sleep(self.period - elapsed);
            }
        }
        info!(
            "Controller stopped after {} cycles ({} processed, {} idle, {} overruns, avg {}ns, max {}ns)",
            self.stats.cycle_count,
            self.stats.processed,
            self.stats.idle,
            self.stats.overruns,
            self.stats.avg_cycle_ns(),
            self.stats.max_cycle_ns
        );
        self.stats
    }

    /// Run on a dedicated thread named `controller`.
    pub fn spawn(self) -> io::Result<JoinHandle<CycleStats>> {
        thread::Builder::new()
            .name("controller".to_string())
            .spawn(move || self.run())
    }
}
