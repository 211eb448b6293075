//! World export documents from the mission-planning UI.
//!
//! ```json
//! {
//!   "config": {"width_cm": 200, "height_cm": 120, "metres_per_cm": 0.05},
//!   "mines": [{"x_cm": 40, "y_cm": 60}],
//!   "start": {"x_cm": 0, "y_cm": 60},
//!   "goal": {"x_cm": 199, "y_cm": 60}
//! }
//! ```
//!
//! One export cell is one centimetre of the UI canvas, so the grid is
//! `width_cm x height_cm` cells at `metres_per_cm` each. Mines are placed at
//! `(x_cm, y_cm) * metres_per_cm`; start and goal are cells.

use std::path::Path;

use marga_map::Cell;
use serde::Deserialize;

use super::commands::{Command, ConfigureData, MineSetData, MineSpec, MissionRequest, PathRequest};
use crate::error::{NavError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub width_cm: i64,
    pub height_cm: i64,
    pub metres_per_cm: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ExportMine {
    pub x_cm: f32,
    pub y_cm: f32,
    /// Avoidance radius in metres
    #[serde(default)]
    pub radius_m: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ExportPoint {
    pub x_cm: i32,
    pub y_cm: i32,
}

impl From<ExportPoint> for Cell {
    fn from(p: ExportPoint) -> Self {
        Cell::new(p.x_cm, p.y_cm)
    }
}

/// Parsed world export.
#[derive(Debug, Clone, Deserialize)]
pub struct WorldExport {
    pub config: ExportConfig,
    #[serde(default)]
    pub mines: Vec<ExportMine>,
    pub start: ExportPoint,
    pub goal: ExportPoint,
}

impl WorldExport {
    /// Parse from a JSON string
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Translate into session commands.
    ///
    /// Without `simulate` the mines are known up front and a single
    /// `compute_path` follows. With it they are hidden and discovered by a
    /// simulated mission.
    pub fn to_commands(&self, default_radius: f32, simulate: bool) -> Result<Vec<Command>> {
        let scale = self.config.metres_per_cm;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(NavError::Parse(format!(
                "metres_per_cm must be positive, got {}",
                scale
            )));
        }

        let mines: Vec<MineSpec> = self
            .mines
            .iter()
            .map(|m| MineSpec {
                x: m.x_cm * scale,
                y: m.y_cm * scale,
                radius: Some(m.radius_m.unwrap_or(default_radius)),
            })
            .collect();

        let mut commands = vec![Command::Configure(ConfigureData {
            width_cells: self.config.width_cm,
            height_cells: self.config.height_cm,
            resolution: scale,
        })];

        if simulate {
            commands.push(Command::SimulateMission(MissionRequest {
                start: self.start.into(),
                goal: self.goal.into(),
                hidden_mines: mines,
                sensor_range: None,
            }));
        } else {
            commands.push(Command::MineSet(MineSetData { mines }));
            commands.push(Command::ComputePath(PathRequest {
                start: self.start.into(),
                goal: self.goal.into(),
            }));
        }

        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"{
        "config": {"width_cm": 200, "height_cm": 120, "metres_per_cm": 0.05},
        "mines": [{"x_cm": 40, "y_cm": 60}, {"x_cm": 100, "y_cm": 20, "radius_m": 1.0}],
        "start": {"x_cm": 0, "y_cm": 60},
        "goal": {"x_cm": 199, "y_cm": 60}
    }"#;

    #[test]
    fn test_known_mines_commands() {
        let export = WorldExport::parse(EXPORT).unwrap();
        let commands = export.to_commands(3.0, false).unwrap();

        assert_eq!(commands.len(), 3);
        assert_eq!(
            commands[0],
            Command::Configure(ConfigureData {
                width_cells: 200,
                height_cells: 120,
                resolution: 0.05,
            })
        );
        let Command::MineSet(set) = &commands[1] else {
            panic!("expected mine_set");
        };
        assert!((set.mines[0].x - 2.0).abs() < 1e-5);
        assert!((set.mines[0].y - 3.0).abs() < 1e-5);
        assert_eq!(set.mines[0].radius, Some(3.0));
        assert_eq!(set.mines[1].radius, Some(1.0));
        assert_eq!(
            commands[2],
            Command::ComputePath(PathRequest {
                start: Cell::new(0, 60),
                goal: Cell::new(199, 60),
            })
        );
    }

    #[test]
    fn test_simulate_commands() {
        let export = WorldExport::parse(EXPORT).unwrap();
        let commands = export.to_commands(3.0, true).unwrap();

        assert_eq!(commands.len(), 2);
        let Command::SimulateMission(req) = &commands[1] else {
            panic!("expected simulate_mission");
        };
        assert_eq!(req.hidden_mines.len(), 2);
        assert_eq!(req.start, Cell::new(0, 60));
    }

    #[test]
    fn test_rejects_bad_scale() {
        let export = WorldExport::parse(
            r#"{"config": {"width_cm": 10, "height_cm": 10, "metres_per_cm": 0},
                "start": {"x_cm": 0, "y_cm": 0}, "goal": {"x_cm": 1, "y_cm": 1}}"#,
        )
        .unwrap();
        assert!(export.to_commands(3.0, false).is_err());
    }
}
