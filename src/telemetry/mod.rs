//! Dispatch telemetry collector and helpers.
//!
//! Fire-and-forget calls swallow their failures, so the collector is what
//! makes "logged and dropped" observable: every dispatch, resolution, skip
//! and failure lands in a bounded history plus a broadcast stream.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use tokio::sync::broadcast;

use crate::error::{BridgeError, ErrorCode};
use crate::platform::Platform;

pub mod events;

pub use events::{DispatchEvent, LifecyclePhase, Outcome};

/// Global telemetry hub for library lifecycle events.
static HUB: Lazy<Arc<TelemetryHub>> = Lazy::new(|| Arc::new(TelemetryHub::default()));

/// Access the global telemetry hub.
pub fn hub() -> Arc<TelemetryHub> {
    Arc::clone(&HUB)
}

/// Snapshot of collector state for CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<DispatchEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of events.
pub struct TelemetryCollector {
    tx: broadcast::Sender<DispatchEvent>,
    history: Mutex<VecDeque<DispatchEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: DispatchEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        if self.history_capacity > 0 {
            let mut history = lock(&self.history);
            if history.len() == self.history_capacity {
                history.pop_front();
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
            history.push_back(event.clone());
        }

        // No subscribers is fine.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let history = lock(&self.history);
        TelemetrySnapshot {
            recent: history.iter().cloned().collect(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

/// Top-level hub wrapping the collector plus per-operation failure counters.
pub struct TelemetryHub {
    collector: TelemetryCollector,
    failures: Mutex<HashMap<String, u64>>,
}

impl TelemetryHub {
    pub fn new(channel_capacity: usize, history_capacity: usize) -> Self {
        Self {
            collector: TelemetryCollector::new(channel_capacity, history_capacity),
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn collector(&self) -> &TelemetryCollector {
        &self.collector
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.collector.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.collector.snapshot()
    }

    pub fn record_dispatch(&self, operation: &str, request_id: Option<i32>) {
        self.collector.publish(DispatchEvent::Dispatched {
            operation: operation.to_string(),
            request_id,
        });
    }

    pub fn record_resolution(&self, request_id: Option<i32>, outcome: Outcome) {
        self.collector
            .publish(DispatchEvent::Resolved { request_id, outcome });
    }

    pub fn record_failure(&self, operation: &str, err: &BridgeError) {
        *lock(&self.failures)
            .entry(operation.to_string())
            .or_insert(0) += 1;

        self.collector.publish(DispatchEvent::DispatchFailed {
            operation: operation.to_string(),
            code: err.code(),
            message: err.message(),
        });
    }

    pub fn record_skipped(&self, operation: &str, platform: Platform) {
        self.collector.publish(DispatchEvent::Skipped {
            operation: operation.to_string(),
            platform,
        });
    }

    pub fn record_unknown_request(&self, request_id: i32) {
        self.collector
            .publish(DispatchEvent::UnknownRequest { request_id });
    }

    pub fn record_id_collision(&self, request_id: i32) {
        self.collector
            .publish(DispatchEvent::IdCollision { request_id });
    }

    pub fn record_lifecycle(&self, phase: LifecyclePhase) {
        self.collector.publish(DispatchEvent::Lifecycle {
            phase,
            timestamp_ms: now_timestamp_ms(),
        });
    }

    /// Number of failed dispatches recorded for `operation`.
    pub fn failure_count(&self, operation: &str) -> u64 {
        lock(&self.failures).get(operation).copied().unwrap_or(0)
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn now_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
