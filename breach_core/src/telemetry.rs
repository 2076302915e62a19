//! Dashboard sinks.
//!
//! The controller publishes a handful of values through `Telemetry`, which
//! must never block the control loop. `ChannelTelemetry` forwards entries to
//! a `TelemetryPublisher` thread over a bounded channel and drops entries
//! when the queue is full.
//!
//! Each `TelemetryPublisher` owns exactly one thread, joined on drop.
use breach_traits::Telemetry;
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryEntry {
    pub key: &'static str,
    pub value: TelemetryValue,
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTelemetry;

impl Telemetry for NullTelemetry {
    fn put_bool(&mut self, _key: &'static str, _value: bool) {}
    fn put_number(&mut self, _key: &'static str, _value: f64) {}
    fn put_text(&mut self, _key: &'static str, _value: &str) {}
}

/// Emits each entry as a `debug!` event on the `telemetry` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn put_bool(&mut self, key: &'static str, value: bool) {
        tracing::debug!(target: "telemetry", key, value);
    }
    fn put_number(&mut self, key: &'static str, value: f64) {
        tracing::debug!(target: "telemetry", key, value);
    }
    fn put_text(&mut self, key: &'static str, value: &str) {
        tracing::debug!(target: "telemetry", key, value);
    }
}

/// Non-blocking sender half handed to the controller.
#[derive(Debug, Clone)]
pub struct ChannelTelemetry {
    tx: xch::Sender<TelemetryEntry>,
    dropped: Arc<AtomicU64>,
}

impl ChannelTelemetry {
    fn send(&self, key: &'static str, value: TelemetryValue) {
        if self.tx.try_send(TelemetryEntry { key, value }).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Entries lost to a full (or closed) queue.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Telemetry for ChannelTelemetry {
    fn put_bool(&mut self, key: &'static str, value: bool) {
        self.send(key, TelemetryValue::Bool(value));
    }
    fn put_number(&mut self, key: &'static str, value: f64) {
        self.send(key, TelemetryValue::Number(value));
    }
    fn put_text(&mut self, key: &'static str, value: &str) {
        self.send(key, TelemetryValue::Text(value.to_owned()));
    }
}

/// Background thread draining a `ChannelTelemetry` into a sink closure.
pub struct TelemetryPublisher {
    shutdown: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    join_handle: Option<std::thread::JoinHandle<u64>>,
}

impl TelemetryPublisher {
    /// Spawn the publisher with a queue of `capacity` entries (at least 1).
    pub fn spawn<F>(capacity: usize, mut sink: F) -> (Self, ChannelTelemetry)
    where
        F: FnMut(TelemetryEntry) + Send + 'static,
    {
        let (tx, rx) = xch::bounded::<TelemetryEntry>(capacity.max(1));
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let dropped = Arc::new(AtomicU64::new(0));

        let join_handle = std::thread::spawn(move || {
            let mut delivered = 0u64;
            while !shutdown_clone.load(Ordering::Relaxed) {
                match rx.recv_timeout(Duration::from_millis(20)) {
                    Ok(entry) => {
                        sink(entry);
                        delivered += 1;
                    }
                    Err(xch::RecvTimeoutError::Timeout) => {}
                    Err(xch::RecvTimeoutError::Disconnected) => break,
                }
            }
            // flush what is already queued
            for entry in rx.try_iter() {
                sink(entry);
                delivered += 1;
            }
            tracing::trace!(delivered, "telemetry publisher exiting");
            delivered
        });

        let publisher = Self {
            shutdown,
            dropped: dropped.clone(),
            join_handle: Some(join_handle),
        };
        (publisher, ChannelTelemetry { tx, dropped })
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop the thread and return how many entries reached the sink.
    pub fn finish(mut self) -> u64 {
        self.shutdown.store(true, Ordering::Relaxed);
        self.join_handle
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or(0)
    }
}

impl Drop for TelemetryPublisher {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("telemetry publisher thread panicked");
        }
    }
}
