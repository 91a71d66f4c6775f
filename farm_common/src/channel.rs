//! Reading channel: stimulus source(s) → controller.
//!
//! An unbounded, ordered, many-producer/one-consumer queue. The consumer only
//! ever polls ([`ReadingReceiver::poll`]); it never blocks on an empty channel.
//! Closing the channel (from any [`ReadingChannel`] handle) makes subsequent
//! sends fail, while a closed or disconnected channel simply polls as empty.

use crate::types::Reading;
use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::debug;

/// Reading channel errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The producer side has been closed, or the consumer is gone.
    #[error("reading channel closed")]
    Closed,
}

/// Owner of the channel. Hands out endpoints and closes the producer side.
#[derive(Debug, Clone)]
pub struct ReadingChannel {
    closed: Arc<AtomicBool>,
}

impl ReadingChannel {
    /// Create a channel with one sender and its single receiver.
    pub fn new() -> (Self, ReadingSender, ReadingReceiver) {
        let (tx, rx) = unbounded();
        let closed = Arc::new(AtomicBool::new(false));
        (
            Self {
                closed: Arc::clone(&closed),
            },
            ReadingSender {
                tx,
                closed: Arc::clone(&closed),
            },
            ReadingReceiver { rx, closed },
        )
    }

    /// Close the producer side. Idempotent.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Reading channel closed");
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Producer endpoint. Clone one per producer.
#[derive(Debug, Clone)]
pub struct ReadingSender {
    tx: Sender<Reading>,
    closed: Arc<AtomicBool>,
}

impl ReadingSender {
    /// Enqueue a reading; ownership moves into the channel.
    ///
    /// # Errors
    /// `ChannelError::Closed` once the channel is closed or the receiver dropped.
    pub fn send(&self, reading: Reading) -> Result<(), ChannelError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChannelError::Closed);
        }
        self.tx.send(reading).map_err(|_| ChannelError::Closed)
    }

    /// Whether sends will be refused.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Single consumer endpoint (deliberately not `Clone`).
#[derive(Debug)]
pub struct ReadingReceiver {
    rx: Receiver<Reading>,
    closed: Arc<AtomicBool>,
}

impl ReadingReceiver {
    /// Take the oldest pending reading without blocking.
    ///
    /// Returns `None` when nothing is pending, and also once the channel is
    /// closed or every sender is gone.
    pub fn poll(&self) -> Option<Reading> {
        if self.closed.load(Ordering::SeqCst) {
            return None;
        }
        match self.rx.try_recv() {
            Ok(reading) => Some(reading),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Number of readings waiting.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_on_empty_channel_returns_none() {
        let (_channel, _tx, rx) = ReadingChannel::new();
        assert!(rx.poll().is_none());
    }

    #[test]
    fn readings_arrive_in_send_order() {
        let (_channel, tx, rx) = ReadingChannel::new();
        for i in 0..5 {
            tx.send(Reading::now(20.0 + i as f64, 50.0)).unwrap();
        }
        assert_eq!(rx.pending(), 5);
        for i in 0..5 {
            let reading = rx.poll().expect("reading");
            assert_eq!(reading.temperature, 20.0 + i as f64);
        }
        assert!(rx.poll().is_none());
    }

    #[test]
    fn closed_channel_rejects_sends_and_polls_empty() {
        let (channel, tx, rx) = ReadingChannel::new();
        tx.send(Reading::now(21.0, 40.0)).unwrap();
        channel.close();
        channel.close();
        assert!(channel.is_closed());
        assert!(tx.is_closed());
        assert_eq!(tx.send(Reading::now(22.0, 40.0)), Err(ChannelError::Closed));
        assert!(rx.poll().is_none());
    }

    #[test]
    fn disconnected_senders_poll_empty() {
        let (_channel, tx, rx) = ReadingChannel::new();
        drop(tx);
        assert!(rx.poll().is_none());
    }

    #[test]
    fn send_fails_after_receiver_dropped() {
        let (_channel, tx, rx) = ReadingChannel::new();
        drop(rx);
        assert_eq!(tx.send(Reading::now(22.0, 40.0)), Err(ChannelError::Closed));
    }
}
