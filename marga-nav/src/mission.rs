//! Simulated mission: fly from start to goal while discovering mines.
//!
//! The planner only knows the mines in the [`World`]. Ground-truth mines
//! are hidden until the drone passes within sensor range, at which point
//! they are revealed into the world and the route is replanned from the
//! drone's current cell.
//!
//! Per step the emitted sequence is `drone_move`, `drone_scan`, then one
//! `mine_detected` per newly seen mine and a `replanning` if the known
//! buffers changed. A reveal that leaves the drone inside a buffer first
//! retraces the travelled path to the last clear cell, one `drone_move`
//! per back-step, and the `replanning` reason is `backed_up`.

use marga_map::{
    AStarPlanner, CancelToken, Cell, Endpoint, GridError, Mine, MineInsert, PathResult, PlanError,
    World, WorldPoint,
};
use serde_json::json;

use crate::error::{NavError, Result};
use crate::events::{EventEmitter, EventKind};

/// Mission tuning taken from config and the command.
#[derive(Clone, Copy, Debug)]
pub struct MissionParams {
    /// Scan radius, world units
    pub sensor_range: f32,
    /// Moves before the mission is aborted
    pub max_steps: usize,
    /// Halo width passed to every replan
    pub halo_distance: f32,
}

/// Result of a completed mission.
#[derive(Clone, Debug, PartialEq)]
pub struct MissionOutcome {
    /// True if the drone reached the goal
    pub found: bool,
    /// Cells actually visited, start first
    pub path: Vec<Cell>,
    /// Length of the visited path
    pub total_cost: f32,
    /// Number of replans triggered by reveals
    pub replans: usize,
}

/// Drives one simulated mission against a session's world.
pub struct MissionRunner<'a> {
    world: &'a mut World,
    emitter: &'a mut EventEmitter,
    planner: &'a AStarPlanner,
    cancel: &'a CancelToken,
    params: MissionParams,
}

impl<'a> MissionRunner<'a> {
    pub fn new(
        world: &'a mut World,
        emitter: &'a mut EventEmitter,
        planner: &'a AStarPlanner,
        cancel: &'a CancelToken,
        params: MissionParams,
    ) -> Self {
        Self {
            world,
            emitter,
            planner,
            cancel,
            params,
        }
    }

    /// Validate hidden mines against the grid.
    ///
    /// Fails on the first mine outside the grid or with a bad radius, so a
    /// rejected mission leaves no trace.
    pub fn hidden_mines(world: &World, mines: &[(WorldPoint, f32)]) -> Result<Vec<Mine>> {
        mines
            .iter()
            .map(|&(position, radius)| {
                if !radius.is_finite() || radius < 0.0 {
                    return Err(GridError::InvalidRadius(radius).into());
                }
                world.grid().position_to_cell(position)?;
                Ok(Mine::new(position, radius))
            })
            .collect()
    }

    /// Fly the mission.
    ///
    /// Errors with [`NavError::MissionAborted`] if the drone runs out of
    /// steps, or lands inside a freshly revealed buffer with no clear
    /// visited cell to back up to.
    pub fn run(mut self, start: Cell, goal: Cell, hidden: &[Mine]) -> Result<MissionOutcome> {
        let map = self.world.traversability(self.params.halo_distance);
        AStarPlanner::check_endpoints(&map, start, goal)?;

        self.emitter
            .emit(EventKind::GoalSet, json!({"start": start, "goal": goal}));

        let mut revealed = vec![false; hidden.len()];
        let mut position = start;
        let mut visited = vec![start];
        let mut total_cost = 0.0;
        let mut replans = 0;

        self.emitter.emit(EventKind::DroneMove, json!(position));
        if self.scan(position, hidden, &mut revealed)? && self.covering_mine(position).is_some() {
            // Nothing travelled yet, so there is nowhere to retreat to
            self.back_up(&mut visited)?;
        }

        // Current plan and index of the drone's cell within it
        let mut plan: Option<(PathResult, usize)> = None;

        while position != goal {
            let steps = visited.len() - 1;
            if steps >= self.params.max_steps {
                return Err(NavError::MissionAborted(format!(
                    "step limit {} reached at {}",
                    self.params.max_steps, position
                )));
            }

            if plan.is_none() {
                match self.replan(position, goal)? {
                    Some(result) => plan = Some((result, 0)),
                    None => {
                        tracing::info!(
                            "Mission: no route from {} to {} after {} steps",
                            position,
                            goal,
                            steps
                        );
                        return Ok(MissionOutcome {
                            found: false,
                            path: visited,
                            total_cost,
                            replans,
                        });
                    }
                }
            }

            let next = match plan.as_mut() {
                Some((route, index)) if *index + 1 < route.path.len() => {
                    *index += 1;
                    route.path[*index]
                }
                _ => {
                    // Route exhausted before the goal; plan again
                    plan = None;
                    continue;
                }
            };

            total_cost += step_length(position, next, self.world.grid().resolution());
            position = next;
            visited.push(position);

            self.emitter.emit(EventKind::DroneMove, json!(position));
            if !self.scan(position, hidden, &mut revealed)? {
                continue;
            }

            let reason = if self.covering_mine(position).is_some() {
                let (safe, retraced) = self.back_up(&mut visited)?;
                total_cost += retraced;
                position = safe;
                "backed_up"
            } else {
                "mine_detected"
            };
            self.emitter.emit(
                EventKind::Replanning,
                json!({"reason": reason, "x": position.x, "y": position.y}),
            );
            replans += 1;
            plan = None;
        }

        tracing::info!(
            "Mission reached goal {} in {} steps ({} replans)",
            goal,
            visited.len() - 1,
            replans
        );
        Ok(MissionOutcome {
            found: true,
            path: visited,
            total_cost,
            replans,
        })
    }

    /// Fly a fixed survey pattern, revealing hidden mines on the way.
    ///
    /// The survey is flown above the buffers, so nothing is replanned or
    /// aborted here; the caller plans once the survey is complete. Returns
    /// the number of mines revealed.
    pub fn sweep(mut self, pattern: &[Cell], hidden: &[Mine]) -> Result<usize> {
        let mut revealed = vec![false; hidden.len()];
        for &cell in pattern {
            self.emitter.emit(EventKind::DroneMove, json!(cell));
            self.scan(cell, hidden, &mut revealed)?;
        }

        let count = revealed.iter().filter(|&&r| r).count();
        tracing::info!(
            "Sweep of {} cells revealed {} of {} mines",
            pattern.len(),
            count,
            hidden.len()
        );
        Ok(count)
    }

    /// Plan from the drone's cell with the mines known now.
    ///
    /// `None` when the goal is unreachable or has been swallowed by a
    /// revealed buffer.
    fn replan(&self, position: Cell, goal: Cell) -> Result<Option<PathResult>> {
        let map = self.world.traversability(self.params.halo_distance);
        match self
            .planner
            .find_path_cancellable(&map, position, goal, self.cancel)
        {
            Ok(result) if result.found => Ok(Some(result)),
            Ok(_) => Ok(None),
            Err(PlanError::InvalidEndpoint {
                endpoint: Endpoint::Goal,
                ..
            }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Reveal hidden mines within sensor range.
    ///
    /// Returns true if the known buffers changed.
    fn scan(&mut self, position: Cell, hidden: &[Mine], revealed: &mut [bool]) -> Result<bool> {
        let here = self.world.grid().cell_to_position(position);
        let range_sq = self.params.sensor_range * self.params.sensor_range;

        let newly: Vec<usize> = hidden
            .iter()
            .enumerate()
            .filter(|&(i, m)| !revealed[i] && m.position.distance_squared(&here) <= range_sq)
            .map(|(i, _)| i)
            .collect();

        let detected: Vec<_> = newly
            .iter()
            .map(|&i| {
                let m = &hidden[i];
                json!({"x": m.position.x, "y": m.position.y, "radius": m.avoidance_radius})
            })
            .collect();
        self.emitter.emit(
            EventKind::DroneScan,
            json!({"x": position.x, "y": position.y, "detected": detected}),
        );

        let mut changed = false;
        for i in newly {
            revealed[i] = true;
            let mine = &hidden[i];
            let insert = self.world.reveal_mine(mine.position, mine.avoidance_radius)?;
            self.emitter.emit(
                EventKind::MineDetected,
                json!({
                    "x": mine.position.x,
                    "y": mine.position.y,
                    "radius": mine.avoidance_radius,
                    "detected": true,
                }),
            );
            changed |= insert != MineInsert::Duplicate;
        }

        Ok(changed)
    }

    /// First known mine whose buffer contains the cell's centre
    fn covering_mine(&self, cell: Cell) -> Option<&Mine> {
        let here = self.world.grid().cell_to_position(cell);
        self.world.mines().iter().find(|m| m.covers(here))
    }

    /// Retrace `visited` to the most recent cell outside every known buffer.
    ///
    /// Each back-step is emitted as a `drone_move` and appended to
    /// `visited`. Returns the safe cell and the distance retraced; aborts
    /// when no visited cell is safe.
    fn back_up(&mut self, visited: &mut Vec<Cell>) -> Result<(Cell, f32)> {
        let Some(&current) = visited.last() else {
            return Err(NavError::MissionAborted("drone has no position".into()));
        };
        let Some(safe_at) = visited.iter().rposition(|&c| self.covering_mine(c).is_none()) else {
            let mine = self
                .covering_mine(current)
                .map(|m| m.position.to_string())
                .unwrap_or_default();
            return Err(NavError::MissionAborted(format!(
                "drone at {} is inside the buffer of the mine at {} and no visited cell is clear",
                current, mine
            )));
        };

        let retrace: Vec<Cell> = visited[safe_at..visited.len() - 1].iter().rev().copied().collect();
        let resolution = self.world.grid().resolution();
        let mut here = current;
        let mut distance = 0.0;
        for cell in retrace {
            distance += step_length(here, cell, resolution);
            here = cell;
            visited.push(cell);
            self.emitter.emit(EventKind::DroneMove, json!(cell));
        }

        tracing::info!("Mission: backed up from {} to {}", current, here);
        Ok((here, distance))
    }
}

fn step_length(from: Cell, to: Cell, resolution: f32) -> f32 {
    if from.x != to.x && from.y != to.y {
        resolution * std::f32::consts::SQRT_2
    } else {
        resolution
    }
}
