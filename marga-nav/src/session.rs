//! Session: one mission's world, planner and event log.
//!
//! Commands are handled one at a time. Every command yields at least one
//! event; failures become an `error` event and never end the session.
//!
//! A successful `configure` or `reset` starts a new mission: the event log
//! of the finished one is moved to [`Session::previous_log`], so the live
//! log only ever holds the current mission.

use marga_map::{
    AStarPlanner, CancelToken, Cell, Mine, PathResult, TraversabilityMap, World, WorldPoint,
    corridor_sweep, simplify_path,
};
use serde_json::{Value, json};

use crate::config::MargaConfig;
use crate::error::{NavError, Result};
use crate::events::{Event, EventEmitter, EventKind};
use crate::mission::{MissionParams, MissionRunner};
use crate::protocol::{
    Command, ConfigureData, Envelope, MineSpec, MissionRequest, PathRequest, SweepRequest,
    WorldExport,
};

/// Owns the world model and drives planning for inbound commands.
pub struct Session {
    config: MargaConfig,
    planner: AStarPlanner,
    world: Option<World>,
    emitter: EventEmitter,
    cancel: CancelToken,
    last_path: Option<PathResult>,
    previous_log: Vec<Event>,
}

impl Session {
    pub fn new(config: MargaConfig, emitter: EventEmitter) -> Self {
        let planner = AStarPlanner::new(config.planner_config());
        Self {
            config,
            planner,
            world: None,
            emitter,
            cancel: CancelToken::new(),
            last_path: None,
            previous_log: Vec::new(),
        }
    }

    /// Share a cancellation token with searches run by this session
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Emit `app_start`
    pub fn announce(&mut self) {
        self.emitter.emit(
            EventKind::AppStart,
            json!({"version": env!("CARGO_PKG_VERSION")}),
        );
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }

    pub fn emitter_mut(&mut self) -> &mut EventEmitter {
        &mut self.emitter
    }

    /// Events of the mission closed by the last `configure` or `reset`
    pub fn previous_log(&self) -> &[Event] {
        &self.previous_log
    }

    /// Result of the last successful `compute_path` or mission
    pub fn last_path(&self) -> Option<&PathResult> {
        self.last_path.as_ref()
    }

    /// Parse and handle one inbound line.
    ///
    /// Blank lines are ignored.
    pub fn handle_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let envelope = match Envelope::parse(line) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.report_error(None, &e);
                return;
            }
        };

        let command_type = envelope.command_type.clone();
        match Command::from_envelope(envelope) {
            Ok(command) => self.handle_command(command),
            Err(e) => self.report_error(Some(&command_type), &e),
        }
    }

    /// Handle a decoded command, reporting failure as an `error` event.
    pub fn handle_command(&mut self, command: Command) {
        tracing::debug!("Handling '{}'", command.name());
        if let Err(e) = self.execute(&command) {
            self.report_error(Some(command.name()), &e);
        }
    }

    /// Ingest a world export as a one-shot batch.
    ///
    /// Returns false if any step produced an `error` event.
    pub fn run_export(&mut self, export: &WorldExport, simulate: bool) -> bool {
        let commands =
            match export.to_commands(self.config.mission.default_mine_radius, simulate) {
                Ok(commands) => commands,
                Err(e) => {
                    self.report_error(Some("batch"), &e);
                    return false;
                }
            };

        let mut ok = true;
        for command in commands {
            if let Err(e) = self.execute(&command) {
                self.report_error(Some(command.name()), &e);
                ok = false;
                break;
            }
        }
        ok
    }

    /// Run a command; errors are returned rather than emitted.
    pub fn execute(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::Configure(data) => self.configure(data),
            Command::MineSet(data) => self.set_mines(&data.mines),
            Command::MineAdd(spec) => self.add_mine(spec),
            Command::ComputePath(request) => self.compute_path(request),
            Command::Reset => self.reset(),
            Command::SimulateMission(request) => self.simulate_mission(request),
            Command::Sweep(request) => self.sweep(request),
        }
    }

    fn configure(&mut self, data: &ConfigureData) -> Result<()> {
        let world = World::configure(data.width_cells, data.height_cells, data.resolution)?;
        let grid = *world.grid();
        self.world = Some(world);
        self.last_path = None;
        self.previous_log = self.emitter.take_log();

        tracing::info!(
            "World configured: {}x{} cells at {}",
            grid.width(),
            grid.height(),
            grid.resolution()
        );
        self.emitter.emit(
            EventKind::WorldConfigured,
            json!({
                "width_cells": grid.width(),
                "height_cells": grid.height(),
                "resolution": grid.resolution(),
            }),
        );
        Ok(())
    }

    fn set_mines(&mut self, specs: &[MineSpec]) -> Result<()> {
        let mines = self.resolve_mines(specs);
        let world = self.world.as_mut().ok_or(NavError::NotConfigured)?;
        let count = world.set_mines(&mines)?;

        let listed: Vec<Value> = world.mines().iter().map(mine_json).collect();
        self.emitter
            .emit(EventKind::MineSet, json!({"mines": listed, "count": count}));
        Ok(())
    }

    fn add_mine(&mut self, spec: &MineSpec) -> Result<()> {
        let radius = spec.radius.unwrap_or(self.config.mission.default_mine_radius);
        let world = self.world.as_mut().ok_or(NavError::NotConfigured)?;
        let insert = world.add_mine(WorldPoint::new(spec.x, spec.y), radius)?;

        tracing::debug!("Mine at ({}, {}) r={}: {:?}", spec.x, spec.y, radius, insert);
        self.emitter.emit(
            EventKind::MineDetected,
            json!({"x": spec.x, "y": spec.y, "radius": radius, "detected": false}),
        );
        Ok(())
    }

    fn compute_path(&mut self, request: &PathRequest) -> Result<()> {
        let world = self.world.as_mut().ok_or(NavError::NotConfigured)?;

        // Snapshot of the current mine set
        let map = world.traversability(self.config.planner.halo_distance);
        AStarPlanner::check_endpoints(&map, request.start, request.goal)?;

        self.emitter.emit(
            EventKind::GoalSet,
            json!({"start": request.start, "goal": request.goal}),
        );

        let result =
            self.planner
                .find_path_cancellable(&map, request.start, request.goal, &self.cancel)?;

        for cell in &result.path {
            self.emitter.emit(EventKind::DroneMove, json!(cell));
        }

        let detected = if result.found {
            world.mark_detected_near(&result.path, self.config.mission.sensor_range)
        } else {
            Vec::new()
        };
        let detected = detected_json(world, &detected);

        tracing::info!(
            "Path {} -> {}: found={} cells={} cost={:.3}",
            request.start,
            request.goal,
            result.found,
            result.path.len(),
            result.total_cost
        );
        self.emit_path_result(
            &map,
            result.found,
            &result.path,
            result.total_cost,
            detected,
        );
        self.last_path = Some(result);
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        let world = self.world.as_mut().ok_or(NavError::NotConfigured)?;
        world.remove_all_mines();
        let grid = *world.grid();
        self.last_path = None;
        self.previous_log = self.emitter.take_log();

        tracing::info!("Mission reset, {} events archived", self.previous_log.len());
        self.emitter.emit(
            EventKind::MissionReset,
            json!({
                "width_cells": grid.width(),
                "height_cells": grid.height(),
                "resolution": grid.resolution(),
            }),
        );
        Ok(())
    }

    fn simulate_mission(&mut self, request: &MissionRequest) -> Result<()> {
        let params = self.mission_params(request.sensor_range)?;
        let sensor_range = params.sensor_range;

        let hidden = self.resolve_mines(&request.hidden_mines);
        let world = self.world.as_mut().ok_or(NavError::NotConfigured)?;
        let hidden: Vec<Mine> = MissionRunner::hidden_mines(world, &hidden)?;

        let outcome = MissionRunner::new(
            world,
            &mut self.emitter,
            &self.planner,
            &self.cancel,
            params,
        )
        .run(request.start, request.goal, &hidden)?;

        let detected = if outcome.found {
            world.mark_detected_near(&outcome.path, sensor_range)
        } else {
            Vec::new()
        };
        let detected = detected_json(world, &detected);
        let map = world.traversability(self.config.planner.halo_distance);

        self.emit_path_result(
            &map,
            outcome.found,
            &outcome.path,
            outcome.total_cost,
            detected,
        );
        self.last_path = Some(PathResult {
            found: outcome.found,
            path: outcome.path,
            total_cost: outcome.total_cost,
            expansions: 0,
        });
        Ok(())
    }

    /// Fly the corridor survey, then plan with whatever it revealed.
    fn sweep(&mut self, request: &SweepRequest) -> Result<()> {
        let params = self.mission_params(request.sensor_range)?;
        let lanes = request.lanes.unwrap_or(self.config.mission.sweep_lanes);
        let spacing = request
            .lane_spacing
            .unwrap_or(self.config.mission.sweep_lane_spacing);
        if lanes == 0 || spacing == 0 {
            return Err(NavError::Parse(
                "lanes and lane_spacing must be > 0".into(),
            ));
        }

        let hidden = self.resolve_mines(&request.hidden_mines);
        let world = self.world.as_mut().ok_or(NavError::NotConfigured)?;
        let hidden: Vec<Mine> = MissionRunner::hidden_mines(world, &hidden)?;

        let map = world.traversability(params.halo_distance);
        AStarPlanner::check_endpoints(&map, request.start, request.goal)?;
        let pattern = corridor_sweep(world.grid(), request.start, request.goal, lanes, spacing);

        tracing::info!(
            "Sweep {} -> {}: {} lanes {} apart, {} cells",
            request.start,
            request.goal,
            lanes,
            spacing,
            pattern.len()
        );
        MissionRunner::new(
            world,
            &mut self.emitter,
            &self.planner,
            &self.cancel,
            params,
        )
        .sweep(&pattern, &hidden)?;

        self.compute_path(&PathRequest {
            start: request.start,
            goal: request.goal,
        })
    }

    /// Mission tuning with an optional per-command sensor range
    fn mission_params(&self, sensor_range: Option<f32>) -> Result<MissionParams> {
        let sensor_range = sensor_range.unwrap_or(self.config.mission.sensor_range);
        if !sensor_range.is_finite() || sensor_range < 0.0 {
            return Err(NavError::Parse(format!(
                "sensor_range must be >= 0, got {}",
                sensor_range
            )));
        }
        Ok(MissionParams {
            sensor_range,
            max_steps: self.config.mission.max_steps,
            halo_distance: self.config.planner.halo_distance,
        })
    }

    fn emit_path_result(
        &mut self,
        map: &TraversabilityMap,
        found: bool,
        path: &[Cell],
        total_cost: f32,
        detected: Vec<Value>,
    ) {
        let waypoints = if self.config.planner.simplify {
            simplify_path(map, path)
        } else {
            path.to_vec()
        };

        self.emitter.emit(
            EventKind::PathResult,
            json!({
                "found": found,
                "path": path,
                "total_cost": total_cost,
                "waypoints": waypoints,
                "detected": detected,
            }),
        );
    }

    fn resolve_mines(&self, specs: &[MineSpec]) -> Vec<(WorldPoint, f32)> {
        specs
            .iter()
            .map(|s| {
                (
                    WorldPoint::new(s.x, s.y),
                    s.radius.unwrap_or(self.config.mission.default_mine_radius),
                )
            })
            .collect()
    }

    fn report_error(&mut self, command: Option<&str>, error: &NavError) {
        tracing::warn!(
            "Command {} failed: {}",
            command.unwrap_or("<unparsed>"),
            error
        );
        self.emitter.emit(
            EventKind::Error,
            json!({
                "message": error.to_string(),
                "command": command,
                "kind": error.kind(),
            }),
        );
    }
}

fn mine_json(mine: &Mine) -> Value {
    json!({
        "x": mine.position.x,
        "y": mine.position.y,
        "radius": mine.avoidance_radius,
        "detected": mine.detected,
    })
}

fn detected_json(world: &World, indices: &[usize]) -> Vec<Value> {
    indices
        .iter()
        .filter_map(|&i| world.mines().get(i))
        .map(|m| json!({"x": m.position.x, "y": m.position.y}))
        .collect()
}
