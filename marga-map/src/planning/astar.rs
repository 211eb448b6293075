//! A* search over the 8-connected traversability grid.
//!
//! Edge weight is the Euclidean step length (`resolution` or
//! `resolution * √2`), plus an optional halo term. BLOCKED cells are never
//! expanded. The heuristic is the straight-line distance to the goal, which
//! never overestimates because every edge costs at least its length.
//!
//! Frontier ties are broken by insertion order, so identical inputs always
//! produce identical paths.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use serde::Serialize;

use crate::core::{Cell, NEIGHBOR_OFFSETS};
use crate::costmap::{CellStatus, TraversabilityMap};
use crate::error::{Endpoint, PlanError};

const NO_PARENT: usize = usize::MAX;

/// Configuration for the A* planner.
#[derive(Clone, Debug)]
pub struct PlannerConfig {
    /// Maximum node expansions before giving up with [`PlanError::SearchLimit`]
    pub max_expansions: usize,
    /// Expansions between cancellation polls
    pub cancel_check_interval: usize,
    /// Multiplier for the halo penalty in edge cost (ignored without a halo)
    pub halo_weight: f32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_expansions: 1_000_000,
            cancel_check_interval: 256,
            halo_weight: 2.0,
        }
    }
}

/// Shared cancellation flag for an in-flight search.
///
/// Cloning shares the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// New token, not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing flag, e.g. a Ctrl-C shutdown flag
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self(flag)
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::SeqCst);
    }

    /// Clear a previous request
    pub fn reset(&self) {
        self.0.store(false, AtomicOrdering::SeqCst);
    }

    /// True once [`CancelToken::cancel`] has been called
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::Relaxed)
    }
}

/// Outcome of a search.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PathResult {
    /// False when the goal is unreachable
    pub found: bool,
    /// Cells from start to goal inclusive; empty when not found
    pub path: Vec<Cell>,
    /// Sum of edge weights along `path`
    pub total_cost: f32,
    /// Nodes expanded by the search
    #[serde(skip)]
    pub expansions: usize,
}

impl PathResult {
    /// A "no path" result
    pub fn not_found(expansions: usize) -> Self {
        Self {
            found: false,
            path: Vec::new(),
            total_cost: 0.0,
            expansions,
        }
    }
}

/// Node in the search frontier.
#[derive(Clone, Copy, Debug)]
struct SearchNode {
    f_score: f32,
    /// Insertion counter, breaks f-score ties FIFO
    seq: u64,
    index: usize,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchNode {}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (lower f_score = higher priority),
        // then earlier insertion first
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* path planner.
#[derive(Clone, Debug, Default)]
pub struct AStarPlanner {
    config: PlannerConfig,
}

impl AStarPlanner {
    /// Create a new planner with configuration.
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Create a new planner with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(PlannerConfig::default())
    }

    /// Planner configuration
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Find a path from `start` to `goal`.
    ///
    /// Fails if either endpoint is out of bounds or BLOCKED. An unreachable
    /// goal is `Ok` with `found == false`.
    pub fn find_path(
        &self,
        map: &TraversabilityMap,
        start: Cell,
        goal: Cell,
    ) -> Result<PathResult, PlanError> {
        self.search(map, start, goal, None)
    }

    /// Like [`AStarPlanner::find_path`], stopping with
    /// [`PlanError::Cancelled`] within `cancel_check_interval` expansions
    /// of the token firing.
    pub fn find_path_cancellable(
        &self,
        map: &TraversabilityMap,
        start: Cell,
        goal: Cell,
        cancel: &CancelToken,
    ) -> Result<PathResult, PlanError> {
        self.search(map, start, goal, Some(cancel))
    }

    fn search(
        &self,
        map: &TraversabilityMap,
        start: Cell,
        goal: Cell,
        cancel: Option<&CancelToken>,
    ) -> Result<PathResult, PlanError> {
        let grid = map.grid();
        let start_idx = Self::validate_endpoint(map, start, Endpoint::Start)?;
        let goal_idx = Self::validate_endpoint(map, goal, Endpoint::Goal)?;

        if start_idx == goal_idx {
            return Ok(PathResult {
                found: true,
                path: vec![start],
                total_cost: 0.0,
                expansions: 0,
            });
        }

        let resolution = grid.resolution();
        let use_halo = map.has_halo() && self.config.halo_weight > 0.0;
        let check_interval = self.config.cancel_check_interval.max(1);

        let total = grid.cell_count();
        let mut g_score = vec![f32::INFINITY; total];
        let mut parent = vec![NO_PARENT; total];
        let mut closed = vec![false; total];
        let mut open_set = BinaryHeap::new();
        let mut seq: u64 = 0;

        g_score[start_idx] = 0.0;
        open_set.push(SearchNode {
            f_score: Self::heuristic(start, goal, resolution),
            seq,
            index: start_idx,
        });

        let mut expansions = 0usize;

        while let Some(node) = open_set.pop() {
            let current_idx = node.index;
            if closed[current_idx] {
                continue;
            }

            if current_idx == goal_idx {
                let path = Self::reconstruct_path(map, &parent, goal_idx);
                log::debug!(
                    "A*: path of {} cells, cost {:.3}, {} expansions",
                    path.len(),
                    g_score[goal_idx],
                    expansions
                );
                return Ok(PathResult {
                    found: true,
                    path,
                    total_cost: g_score[goal_idx],
                    expansions,
                });
            }

            closed[current_idx] = true;
            expansions += 1;

            if expansions > self.config.max_expansions {
                log::warn!(
                    "A* exceeded max expansions ({})",
                    self.config.max_expansions
                );
                return Err(PlanError::SearchLimit {
                    limit: self.config.max_expansions,
                });
            }

            if let Some(token) = cancel
                && expansions % check_interval == 0
                && token.is_cancelled()
            {
                log::warn!("A* cancelled after {} expansions", expansions);
                return Err(PlanError::Cancelled { expansions });
            }

            let current = grid.cell_at(current_idx);
            let current_g = g_score[current_idx];

            for (dx, dy) in NEIGHBOR_OFFSETS {
                let neighbor = Cell::new(current.x + dx, current.y + dy);
                let Some(neighbor_idx) = grid.index(neighbor) else {
                    continue;
                };

                if closed[neighbor_idx] || map.status_at(neighbor_idx) == CellStatus::Blocked {
                    continue;
                }

                let step = if dx != 0 && dy != 0 {
                    resolution * std::f32::consts::SQRT_2
                } else {
                    resolution
                };
                let edge_cost = if use_halo {
                    let penalty =
                        0.5 * (map.penalty_at(current_idx) + map.penalty_at(neighbor_idx));
                    step + self.config.halo_weight * penalty * step
                } else {
                    step
                };

                let new_g = current_g + edge_cost;
                if new_g < g_score[neighbor_idx] {
                    g_score[neighbor_idx] = new_g;
                    parent[neighbor_idx] = current_idx;
                    seq += 1;
                    open_set.push(SearchNode {
                        f_score: new_g + Self::heuristic(neighbor, goal, resolution),
                        seq,
                        index: neighbor_idx,
                    });
                }
            }
        }

        log::debug!("A*: frontier exhausted after {} expansions, no path", expansions);
        Ok(PathResult::not_found(expansions))
    }

    /// Check both endpoints without searching.
    ///
    /// Same errors, in the same order, as [`AStarPlanner::find_path`].
    pub fn check_endpoints(
        map: &TraversabilityMap,
        start: Cell,
        goal: Cell,
    ) -> Result<(), PlanError> {
        Self::validate_endpoint(map, start, Endpoint::Start)?;
        Self::validate_endpoint(map, goal, Endpoint::Goal)?;
        Ok(())
    }

    fn validate_endpoint(
        map: &TraversabilityMap,
        cell: Cell,
        endpoint: Endpoint,
    ) -> Result<usize, PlanError> {
        let grid = map.grid();
        let Some(idx) = grid.index(cell) else {
            return Err(PlanError::OutOfBounds {
                endpoint,
                cell,
                width: grid.width(),
                height: grid.height(),
            });
        };
        if map.status_at(idx) == CellStatus::Blocked {
            return Err(PlanError::InvalidEndpoint { endpoint, cell });
        }
        Ok(idx)
    }

    /// Compute heuristic (Euclidean distance, scaled by resolution).
    #[inline]
    fn heuristic(from: Cell, to: Cell, resolution: f32) -> f32 {
        from.euclidean_distance(&to) * resolution
    }

    /// Reconstruct path from parent array.
    fn reconstruct_path(map: &TraversabilityMap, parent: &[usize], goal_idx: usize) -> Vec<Cell> {
        let mut path = Vec::new();
        let mut current = goal_idx;

        loop {
            path.push(map.grid().cell_at(current));
            match parent[current] {
                NO_PARENT => break,
                p => current = p,
            }
        }

        path.reverse();
        path
    }
}

/// Find a path with the default planner configuration.
pub fn find_path(
    map: &TraversabilityMap,
    start: Cell,
    goal: Cell,
) -> Result<PathResult, PlanError> {
    AStarPlanner::with_defaults().find_path(map, start, goal)
}
