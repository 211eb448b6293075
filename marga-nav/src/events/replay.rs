//! Rebuild final mission state from an event log.

use std::io::BufRead;

use marga_map::{Cell, World, WorldPoint};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::{Event, EventKind};
use crate::error::{NavError, Result};

/// Path carried by the last `path_result`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ReplayedPath {
    pub found: bool,
    pub path: Vec<Cell>,
    pub total_cost: f32,
    #[serde(default)]
    pub waypoints: Vec<Cell>,
}

/// State reconstructed by [`replay`].
#[derive(Clone, Debug, Default)]
pub struct ReplayState {
    /// Grid and mines, `None` until a `world_configured` event
    pub world: Option<World>,
    pub start: Option<Cell>,
    pub goal: Option<Cell>,
    /// Last cell reported by `drone_move` or `drone_scan`
    pub drone: Option<Cell>,
    pub last_path: Option<ReplayedPath>,
    /// Number of `error` events seen
    pub errors: usize,
}

#[derive(Deserialize)]
struct WorldConfigured {
    width_cells: i64,
    height_cells: i64,
    resolution: f32,
}

#[derive(Deserialize)]
struct MineEntry {
    x: f32,
    y: f32,
    radius: f32,
    #[serde(default)]
    detected: bool,
}

#[derive(Deserialize)]
struct MineSet {
    mines: Vec<MineEntry>,
}

#[derive(Deserialize)]
struct GoalSet {
    start: Cell,
    goal: Cell,
}

#[derive(Deserialize)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Deserialize)]
struct PathResultData {
    #[serde(flatten)]
    path: ReplayedPath,
    #[serde(default)]
    detected: Vec<Position>,
}

/// Replay an event log.
///
/// Foreign event types are skipped. A known event with a malformed payload,
/// or a world-mutating event before `world_configured`, is an error.
pub fn replay(events: &[Event]) -> Result<ReplayState> {
    let mut state = ReplayState::default();

    for event in events {
        let Some(kind) = event.kind() else {
            continue;
        };

        match kind {
            EventKind::WorldConfigured => {
                let cfg: WorldConfigured = payload(event)?;
                state = state.restart(&cfg)?;
            }
            EventKind::MineSet => {
                let set: MineSet = payload(event)?;
                let world = configured(&mut state.world)?;
                world.remove_all_mines();
                for mine in set.mines {
                    insert_mine(world, mine)?;
                }
            }
            EventKind::MineDetected => {
                let mine: MineEntry = payload(event)?;
                insert_mine(configured(&mut state.world)?, mine)?;
            }
            EventKind::GoalSet => {
                let goal: GoalSet = payload(event)?;
                state.start = Some(goal.start);
                state.goal = Some(goal.goal);
            }
            EventKind::DroneMove | EventKind::DroneScan => {
                state.drone = Some(payload::<Cell>(event)?);
            }
            EventKind::PathResult => {
                let result: PathResultData = payload(event)?;
                let world = configured(&mut state.world)?;
                for p in result.detected {
                    world.mark_detected_at(WorldPoint::new(p.x, p.y));
                }
                state.last_path = Some(result.path);
            }
            EventKind::MissionReset => {
                // Resets carry the grid so an archived mission log replays alone
                match WorldConfigured::deserialize(&event.data) {
                    Ok(cfg) => state = state.restart(&cfg)?,
                    Err(_) => {
                        configured(&mut state.world)?.remove_all_mines();
                        state.start = None;
                        state.goal = None;
                        state.drone = None;
                        state.last_path = None;
                    }
                }
            }
            EventKind::Error => state.errors += 1,
            EventKind::AppStart | EventKind::Replanning => {}
        }
    }

    Ok(state)
}

/// Read a JSON-lines event log, skipping blank lines.
pub fn read_event_log<R: BufRead>(reader: R) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line)
            .map_err(|e| NavError::Parse(format!("line {}: {}", number + 1, e)))?;
        events.push(event);
    }
    Ok(events)
}

impl ReplayState {
    /// Fresh state on a new grid; the error count carries over.
    fn restart(&self, cfg: &WorldConfigured) -> Result<Self> {
        Ok(Self {
            world: Some(World::configure(
                cfg.width_cells,
                cfg.height_cells,
                cfg.resolution,
            )?),
            errors: self.errors,
            ..Self::default()
        })
    }

    /// Compact JSON description of the reconstructed state
    pub fn summary(&self) -> Value {
        let world = self.world.as_ref().map(|w| {
            json!({
                "width_cells": w.grid().width(),
                "height_cells": w.grid().height(),
                "resolution": w.grid().resolution(),
                "mines": w.mines().len(),
                "detected": w.mines().iter().filter(|m| m.detected).count(),
            })
        });
        let path = self.last_path.as_ref().map(|p| {
            json!({
                "found": p.found,
                "length": p.path.len(),
                "total_cost": p.total_cost,
            })
        });

        json!({
            "world": world,
            "start": self.start,
            "goal": self.goal,
            "drone": self.drone,
            "last_path": path,
            "errors": self.errors,
        })
    }
}

fn payload<T: DeserializeOwned>(event: &Event) -> Result<T> {
    T::deserialize(&event.data)
        .map_err(|e| NavError::Parse(format!("{} payload: {}", event.event_type, e)))
}

fn configured(world: &mut Option<World>) -> Result<&mut World> {
    world.as_mut().ok_or(NavError::NotConfigured)
}

fn insert_mine(world: &mut World, mine: MineEntry) -> Result<()> {
    let position = WorldPoint::new(mine.x, mine.y);
    if mine.detected {
        world.reveal_mine(position, mine.radius)?;
    } else {
        world.add_mine(position, mine.radius)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(kind: &str, data: serde_json::Value) -> Event {
        Event {
            event_type: kind.into(),
            ts: 0.0,
            data,
        }
    }

    #[test]
    fn test_replay_basic_mission() {
        let log = vec![
            event("app_start", json!({"version": "0.1.0"})),
            event(
                "world_configured",
                json!({"width_cells": 10, "height_cells": 10, "resolution": 1.0}),
            ),
            event(
                "mine_set",
                json!({"mines": [{"x": 5.0, "y": 5.0, "radius": 2.0, "detected": false}], "count": 1}),
            ),
            event("goal_set", json!({"start": {"x": 0, "y": 5}, "goal": {"x": 9, "y": 5}})),
            event("drone_move", json!({"x": 0, "y": 5})),
            event("drone_move", json!({"x": 1, "y": 4})),
            event(
                "path_result",
                json!({
                    "found": true,
                    "path": [{"x": 0, "y": 5}, {"x": 1, "y": 4}],
                    "total_cost": 1.414,
                    "waypoints": [],
                    "detected": [{"x": 5.0, "y": 5.0}]
                }),
            ),
            event("some_foreign_event", json!(null)),
        ];

        let state = replay(&log).unwrap();
        let world = state.world.unwrap();
        assert_eq!(world.grid().width(), 10);
        assert_eq!(world.mines().len(), 1);
        assert!(world.mines()[0].detected);
        assert_eq!(state.goal, Some(Cell::new(9, 5)));
        assert_eq!(state.drone, Some(Cell::new(1, 4)));
        assert!(state.last_path.unwrap().found);
    }

    #[test]
    fn test_replay_reset_and_reconfigure() {
        let log = vec![
            event(
                "world_configured",
                json!({"width_cells": 5, "height_cells": 5, "resolution": 1.0}),
            ),
            event("mine_detected", json!({"x": 1.0, "y": 1.0, "radius": 0.5, "detected": true})),
            event("error", json!({"message": "x", "command": null, "kind": "parse_error"})),
            event("mission_reset", json!({})),
        ];

        let state = replay(&log).unwrap();
        assert!(state.world.as_ref().unwrap().mines().is_empty());
        assert_eq!(state.errors, 1);
        assert!(state.last_path.is_none());
    }

    #[test]
    fn test_reset_with_grid_starts_a_log() {
        let log = vec![
            event(
                "mission_reset",
                json!({"width_cells": 8, "height_cells": 6, "resolution": 0.5}),
            ),
            event("mine_detected", json!({"x": 1.0, "y": 1.0, "radius": 0.5, "detected": true})),
            event("drone_scan", json!({"x": 2, "y": 2, "detected": []})),
        ];

        let state = replay(&log).unwrap();
        let world = state.world.as_ref().unwrap();
        assert_eq!(world.grid().width(), 8);
        assert_eq!(world.grid().resolution(), 0.5);
        assert_eq!(world.mines().len(), 1);

        let summary = state.summary();
        assert_eq!(summary["world"]["height_cells"], json!(6));
        assert_eq!(summary["world"]["detected"], json!(1));
        assert_eq!(summary["drone"], json!({"x": 2, "y": 2}));
        assert_eq!(summary["last_path"], Value::Null);
    }

    #[test]
    fn test_read_event_log() {
        let text = concat!(
            "{\"type\":\"world_configured\",\"ts\":1.0,\"data\":{\"width_cells\":4,\"height_cells\":4,\"resolution\":1.0}}\n",
            "\n",
            "{\"type\":\"drone_move\",\"ts\":2.0,\"data\":{\"x\":3,\"y\":1}}\n",
        );
        let events = read_event_log(text.as_bytes()).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[1].is(EventKind::DroneMove));
        assert_eq!(replay(&events).unwrap().drone, Some(Cell::new(3, 1)));

        let broken = "{\"type\":\"drone_move\"}\nnot json\n";
        match read_event_log(broken.as_bytes()) {
            Err(NavError::Parse(message)) => assert!(message.starts_with("line 1")),
            other => panic!("expected parse error, got {:?}", other.map(|e| e.len())),
        }
    }

    #[test]
    fn test_replay_requires_configure() {
        let log = vec![event(
            "mine_detected",
            json!({"x": 1.0, "y": 1.0, "radius": 0.5}),
        )];
        assert!(matches!(replay(&log), Err(NavError::NotConfigured)));
    }

    #[test]
    fn test_replay_rejects_bad_payload() {
        let log = vec![event("world_configured", json!({"width_cells": "ten"}))];
        assert!(matches!(replay(&log), Err(NavError::Parse(_))));
    }
}
