//! Telemetry event types describing dispatch and completion activity.

use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Library and player lifecycle stages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    LibraryLoaded,
    PlayerInitialized,
    PlayerReleased,
    RouteInstalled,
    RouteRemoved,
}

/// Terminal state of a play request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum DispatchEvent {
    /// A native call was issued. `request_id` is set for correlated plays.
    Dispatched {
        operation: String,
        request_id: Option<i32>,
    },
    /// A completion was delivered to its callback.
    Resolved {
        request_id: Option<i32>,
        outcome: Outcome,
    },
    /// A native call failed synchronously; logged and dropped or forwarded.
    DispatchFailed {
        operation: String,
        code: i32,
        message: String,
    },
    /// Operation skipped because the platform has no native player.
    Skipped {
        operation: String,
        platform: Platform,
    },
    /// Native signal for an id that is no longer registered.
    UnknownRequest { request_id: i32 },
    /// A wrapped id aliased a still-pending request.
    IdCollision { request_id: i32 },
    Lifecycle {
        phase: LifecyclePhase,
        timestamp_ms: u64,
    },
}
