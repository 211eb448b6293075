//! Outbound mission events.
//!
//! Every event shares the `{type, ts, data}` envelope of the inbound
//! protocol and is written one JSON object per line.
//!
//! # Event Types
//!
//! | type               | data                                              |
//! |--------------------|---------------------------------------------------|
//! | `app_start`        | `{version}`                                       |
//! | `world_configured` | `{width_cells, height_cells, resolution}`         |
//! | `mine_set`         | `{mines: [{x, y, radius, detected}], count}`      |
//! | `mine_detected`    | `{x, y, radius, detected}`                        |
//! | `goal_set`         | `{start: {x, y}, goal: {x, y}}`                   |
//! | `drone_move`       | `{x, y}`                                          |
//! | `drone_scan`       | `{x, y, detected: [{x, y, radius}]}`              |
//! | `replanning`       | `{reason, x, y}`                                  |
//! | `path_result`      | `{found, path, total_cost, waypoints, detected}`  |
//! | `mission_reset`    | `{width_cells, height_cells, resolution}`         |
//! | `error`            | `{message, command, kind}`                        |

mod emitter;
mod replay;

pub use emitter::{EventEmitter, EventListener, JsonLinesWriter};
pub use replay::{ReplayState, ReplayedPath, read_event_log, replay};

use serde::{Deserialize, Serialize};

/// Kind of an outbound event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    AppStart,
    WorldConfigured,
    MineSet,
    MineDetected,
    GoalSet,
    DroneMove,
    DroneScan,
    Replanning,
    PathResult,
    MissionReset,
    Error,
}

impl EventKind {
    /// Wire name of the event type
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::AppStart => "app_start",
            EventKind::WorldConfigured => "world_configured",
            EventKind::MineSet => "mine_set",
            EventKind::MineDetected => "mine_detected",
            EventKind::GoalSet => "goal_set",
            EventKind::DroneMove => "drone_move",
            EventKind::DroneScan => "drone_scan",
            EventKind::Replanning => "replanning",
            EventKind::PathResult => "path_result",
            EventKind::MissionReset => "mission_reset",
            EventKind::Error => "error",
        }
    }

    /// Parse a wire name
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "app_start" => EventKind::AppStart,
            "world_configured" => EventKind::WorldConfigured,
            "mine_set" => EventKind::MineSet,
            "mine_detected" => EventKind::MineDetected,
            "goal_set" => EventKind::GoalSet,
            "drone_move" => EventKind::DroneMove,
            "drone_scan" => EventKind::DroneScan,
            "replanning" => EventKind::Replanning,
            "path_result" => EventKind::PathResult,
            "mission_reset" => EventKind::MissionReset,
            "error" => EventKind::Error,
            _ => return None,
        })
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the mission event log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event type
    #[serde(rename = "type")]
    pub event_type: String,
    /// Seconds since the Unix epoch, non-decreasing within a log
    pub ts: f64,
    /// Type-specific payload
    pub data: serde_json::Value,
}

impl Event {
    /// Typed event kind, `None` for foreign types
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::parse(&self.event_type)
    }

    /// True if this event is of the given kind
    pub fn is(&self, kind: EventKind) -> bool {
        self.event_type == kind.as_str()
    }
}
