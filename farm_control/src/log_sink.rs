//! Decision log: controller → background writer hand-off.
//!
//! The controller enqueues one [`LogRecord`] per processed reading through a
//! [`LogSender`]. The queue is bounded; when it is full the oldest queued
//! record is evicted so the control cycle never waits on disk I/O. A single
//! [`LogSink`] thread formats records in FIFO order, appends one line per
//! record and flushes after each write.
//!
//! Dropping the `LogSender` closes the enqueue side. The sink then drains
//! every record already queued, writes the session-end marker and exits.
//!
//! ## Text layout
//! ```text
//!
//! ===== session start 2026-10-18 09:00:00 =====
//! time                  temp(C)  humidity(%)  heater   fan
//! --------------------------------------------------------
//! 2026-10-18 09:00:01     25.13        50.20      ON   OFF
//! ===== session end 2026-10-18 09:10:00 =====
//! ```

use chrono::{DateTime, Local};
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use farm_common::config::{LogConfig, LogFormat};
use farm_common::types::LogRecord;
use serde_json::json;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Count of records evicted by the drop-oldest policy.
#[derive(Debug, Clone, Default)]
pub struct DropCounter(Arc<AtomicU64>);

impl DropCounter {
    /// Records evicted so far.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

/// Result of [`LogSender::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// Record queued without loss.
    Queued,
    /// Record queued after evicting the oldest queued record.
    DroppedOldest,
    /// Sink side is gone; record discarded.
    Closed,
}

/// Enqueue side of the decision log. Dropping it closes the queue.
#[derive(Debug)]
pub struct LogSender {
    tx: Sender<LogRecord>,
    // Receiver clone used only to evict the head when the queue is full.
    evict: Receiver<LogRecord>,
    dropped: DropCounter,
}

/// Dequeue side of the decision log, owned by the sink.
#[derive(Debug)]
pub struct LogReceiver {
    rx: Receiver<LogRecord>,
}

/// Create a bounded decision-log queue.
///
/// A capacity of zero is raised to one.
pub fn log_channel(capacity: usize) -> (LogSender, LogReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
    let sender = LogSender {
        tx,
        evict: rx.clone(),
        dropped: DropCounter::default(),
    };
    (sender, LogReceiver { rx })
}

impl LogSender {
    /// Queue `record` without blocking, evicting the oldest record if full.
    pub fn enqueue(&self, mut record: LogRecord) -> Enqueued {
        let mut evicted = false;
        loop {
            match self.tx.try_send(record) {
                Ok(()) if evicted => return Enqueued::DroppedOldest,
                Ok(()) => return Enqueued::Queued,
                Err(TrySendError::Full(back)) => {
                    record = back;
                    if self.evict.try_recv().is_ok() {
                        self.dropped.increment();
                        evicted = true;
                    }
                }
                Err(TrySendError::Disconnected(_)) => return Enqueued::Closed,
            }
        }
    }

    /// Shared handle to the eviction counter; outlives the sender.
    pub fn drop_counter(&self) -> DropCounter {
        self.dropped.clone()
    }

    /// Records currently queued.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

/// Counters reported when the sink exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogSinkStats {
    /// Records written.
    pub written: u64,
    /// Records given up on after exhausting write retries.
    pub failed: u64,
}

/// Background writer draining the decision-log queue.
pub struct LogSink<W: Write> {
    rx: Receiver<LogRecord>,
    writer: W,
    format: LogFormat,
    retries: u32,
    stats: LogSinkStats,
}

impl LogSink<File> {
    /// Open the configured log file for appending (created if missing).
    pub fn open(config: &LogConfig, receiver: LogReceiver) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;
        info!("Decision log opened at {:?}", config.path);
        Ok(Self::with_writer(file, config, receiver))
    }
}

impl<W: Write> LogSink<W> {
    /// Sink writing to an arbitrary writer.
    pub fn with_writer(writer: W, config: &LogConfig, receiver: LogReceiver) -> Self {
        Self {
            rx: receiver.rx,
            writer,
            format: config.format,
            retries: config.write_retries.max(1),
            stats: LogSinkStats::default(),
        }
    }

    /// Write records until the enqueue side is closed and the queue is empty.
    pub fn run(mut self) -> LogSinkStats {
        let start = session_start(self.format, Local::now());
        self.write_line(&start);

        // `recv` keeps returning queued records after the sender is dropped
        // and only fails once the queue is empty.
        while let Ok(record) = self.rx.recv() {
            self.write_record(&record);
        }

        let end = session_end(self.format, Local::now());
        self.write_line(&end);
        info!(
            "Decision log drained: {} written, {} failed",
            self.stats.written, self.stats.failed
        );
        self.stats
    }

    fn write_record(&mut self, record: &LogRecord) {
        let line = match format_record(self.format, record) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to format log record: {}", e);
                self.stats.failed += 1;
                return;
            }
        };
        if self.write_line(&line) {
            self.stats.written += 1;
        } else {
            self.stats.failed += 1;
        }
    }

    /// Append and flush `text`, retrying up to the configured attempt count.
    ///
    /// A retry resumes after the bytes a failed attempt already accepted, so
    /// a partial write never duplicates the start of the line.
    fn write_line(&mut self, text: &str) -> bool {
        let bytes = text.as_bytes();
        let mut offset = 0;
        for attempt in 1..=self.retries {
            match self.write_from(bytes, &mut offset) {
                Ok(()) => return true,
                Err(e) if attempt < self.retries => {
                    debug!("Log write attempt {} failed at byte {}: {}", attempt, offset, e);
                }
                Err(e) => {
                    warn!("Dropping log line after {} attempts: {}", attempt, e);
                }
            }
        }
        if offset > 0 && offset < bytes.len() {
            // Terminate the fragment so the next line starts on its own.
            let _ = self.writer.write_all(b"\n").and_then(|()| self.writer.flush());
        }
        false
    }

    fn write_from(&mut self, bytes: &[u8], offset: &mut usize) -> io::Result<()> {
        while *offset < bytes.len() {
            match self.writer.write(&bytes[*offset..]) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => *offset += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        self.writer.flush()
    }
}

impl<W: Write + Send + 'static> LogSink<W> {
    /// Run on a dedicated thread named `log-sink`.
    pub fn spawn(self) -> io::Result<JoinHandle<LogSinkStats>> {
        thread::Builder::new()
            .name("log-sink".to_string())
            .spawn(move || self.run())
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

/// Column header of the text layout.
pub fn text_header() -> String {
    format!(
        "{:<19}  {:>8}  {:>11}  {:>6}  {:>4}",
        "time", "temp(C)", "humidity(%)", "heater", "fan"
    )
}

/// Format one record as a single line (newline included).
pub fn format_record(format: LogFormat, record: &LogRecord) -> Result<String, serde_json::Error> {
    match format {
        LogFormat::Text => Ok(format!(
            "{:<19}  {:>8.2}  {:>11.2}  {:>6}  {:>4}\n",
            record.observed_at.format(TIME_FORMAT),
            record.temperature,
            record.humidity,
            on_off(record.heater_on),
            on_off(record.fan_on)
        )),
        LogFormat::Json => {
            let mut line = serde_json::to_string(record)?;
            line.push('\n');
            Ok(line)
        }
    }
}

fn session_start(format: LogFormat, now: DateTime<Local>) -> String {
    match format {
        LogFormat::Text => {
            let header = text_header();
            format!(
                "\n===== session start {} =====\n{}\n{}\n",
                now.format(TIME_FORMAT),
                header,
                "-".repeat(header.len())
            )
        }
        LogFormat::Json => format!(
            "{}\n",
            json!({ "event": "session_start", "at": now.format(TIME_FORMAT).to_string() })
        ),
    }
}

fn session_end(format: LogFormat, now: DateTime<Local>) -> String {
    match format {
        LogFormat::Text => format!("===== session end {} =====\n", now.format(TIME_FORMAT)),
        LogFormat::Json => format!(
            "{}\n",
            json!({ "event": "session_end", "at": now.format(TIME_FORMAT).to_string() })
        ),
    }
}

impl LogReceiver {
    /// Take the next queued record without blocking.
    ///
    /// For consumers other than [`LogSink`], e.g. tests inspecting the queue.
    pub fn try_next(&self) -> Option<LogRecord> {
        match self.rx.try_recv() {
            Ok(record) => Some(record),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}
