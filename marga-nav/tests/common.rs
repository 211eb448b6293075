//! Test utilities for MargaNav session tests.

#![allow(dead_code)]

use marga_nav::{Event, EventEmitter, MargaConfig, Session};
use serde_json::{Value, json};

/// Session with default configuration and no listeners.
pub fn session() -> Session {
    Session::new(MargaConfig::default(), EventEmitter::new())
}

/// Session with a custom configuration.
pub fn session_with(config: MargaConfig) -> Session {
    Session::new(config, EventEmitter::new())
}

/// Build one inbound command line.
pub fn line(command: &str, data: Value) -> String {
    json!({"type": command, "ts": 0.0, "data": data}).to_string()
}

pub fn configure(width: i64, height: i64, resolution: f32) -> String {
    line(
        "configure",
        json!({"width_cells": width, "height_cells": height, "resolution": resolution}),
    )
}

pub fn compute_path(start: (i32, i32), goal: (i32, i32)) -> String {
    line(
        "compute_path",
        json!({"start": {"x": start.0, "y": start.1}, "goal": {"x": goal.0, "y": goal.1}}),
    )
}

/// Event types in emission order.
pub fn types(events: &[Event]) -> Vec<String> {
    events.iter().map(|e| e.event_type.clone()).collect()
}

/// Events of one type.
pub fn of_type<'a>(events: &'a [Event], event_type: &str) -> Vec<&'a Event> {
    events.iter().filter(|e| e.event_type == event_type).collect()
}

/// Events emitted after the first `skip`.
pub fn since(session: &Session, skip: usize) -> Vec<Event> {
    session.emitter().log()[skip..].to_vec()
}
