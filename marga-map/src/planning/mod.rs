//! Path planning over the traversability map.
//!
//! This module provides:
//! - A* planner on the 8-connected grid with FIFO tie-breaking
//! - Cooperative cancellation through [`CancelToken`]
//! - Line-of-sight waypoint simplification
//! - Snake-pattern corridor sweeps for survey flights

mod astar;
mod simplify;
mod sweep;

pub use astar::{AStarPlanner, CancelToken, PathResult, PlannerConfig, find_path};
pub use simplify::simplify_path;
pub use sweep::corridor_sweep;
