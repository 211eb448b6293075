//! Inbound command envelope and typed commands.
//!
//! Each line is `{"type": "<command>", "ts": <float>, "data": {...}}`.
//! `ts` is optional and ignored. Parsing happens in two stages so that an
//! unknown `type` can be told apart from a known type with a bad payload.

use marga_map::Cell;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{NavError, Result};

/// Raw inbound line before dispatch on `type`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub command_type: String,
    #[serde(default)]
    pub ts: Option<f64>,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Parse one JSON line
    pub fn parse(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }
}

/// Grid dimensions for `configure`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ConfigureData {
    pub width_cells: i64,
    pub height_cells: i64,
    pub resolution: f32,
}

/// A mine in world units; radius falls back to the configured default.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MineSpec {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub radius: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MineSetData {
    pub mines: Vec<MineSpec>,
}

/// Start and goal cells for `compute_path`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PathRequest {
    pub start: Cell,
    pub goal: Cell,
}

/// Payload of `simulate_mission`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MissionRequest {
    pub start: Cell,
    pub goal: Cell,
    /// Ground-truth mines, unknown to the planner until scanned
    #[serde(default)]
    pub hidden_mines: Vec<MineSpec>,
    /// Overrides `mission.sensor_range`
    #[serde(default)]
    pub sensor_range: Option<f32>,
}

/// Payload of `sweep`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SweepRequest {
    pub start: Cell,
    pub goal: Cell,
    /// Overrides `mission.sweep_lanes`
    #[serde(default)]
    pub lanes: Option<usize>,
    /// Overrides `mission.sweep_lane_spacing`, in cells
    #[serde(default)]
    pub lane_spacing: Option<u32>,
    #[serde(default)]
    pub hidden_mines: Vec<MineSpec>,
    /// Overrides `mission.sensor_range`
    #[serde(default)]
    pub sensor_range: Option<f32>,
}

/// Session commands
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// (Re)configure the grid; clears mines
    Configure(ConfigureData),
    /// Replace the whole mine set
    MineSet(MineSetData),
    /// Add one mine
    MineAdd(MineSpec),
    /// Plan and report a path
    ComputePath(PathRequest),
    /// Clear mines and path state, keep the grid
    Reset,
    /// Fly start to goal, discovering hidden mines on the way
    SimulateMission(MissionRequest),
    /// Survey the start-goal corridor in a snake pattern, then plan
    Sweep(SweepRequest),
}

impl Command {
    /// Wire name of the command
    pub fn name(&self) -> &'static str {
        match self {
            Command::Configure(_) => "configure",
            Command::MineSet(_) => "mine_set",
            Command::MineAdd(_) => "mine_add",
            Command::ComputePath(_) => "compute_path",
            Command::Reset => "reset",
            Command::SimulateMission(_) => "simulate_mission",
            Command::Sweep(_) => "sweep",
        }
    }

    /// Decode the payload of an envelope.
    pub fn from_envelope(envelope: Envelope) -> Result<Self> {
        let data = envelope.data;
        let command = match envelope.command_type.as_str() {
            "configure" => Command::Configure(decode(data)?),
            "mine_set" => Command::MineSet(decode(data)?),
            "mine_add" => Command::MineAdd(decode(data)?),
            "compute_path" => Command::ComputePath(decode(data)?),
            "reset" => Command::Reset,
            "simulate_mission" => Command::SimulateMission(decode(data)?),
            "sweep" => Command::Sweep(decode(data)?),
            _ => return Err(NavError::UnknownCommand(envelope.command_type)),
        };
        Ok(command)
    }
}

fn decode<T: for<'de> Deserialize<'de>>(data: Value) -> Result<T> {
    Ok(serde_json::from_value(data)?)
}
