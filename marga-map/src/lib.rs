//! # Marga-Map: Mine-Aware Grid Planning
//!
//! Spatial model and search engine for planning a safe route across a
//! grid contaminated with landmines.
//!
//! ## Quick Start
//!
//! ```rust
//! use marga_map::{Cell, World, WorldPoint, find_path};
//!
//! let mut world = World::configure(10, 10, 1.0).unwrap();
//! world.add_mine(WorldPoint::new(5.0, 5.0), 2.0).unwrap();
//!
//! let map = world.traversability(0.0);
//! let result = find_path(&map, Cell::new(0, 5), Cell::new(9, 5)).unwrap();
//! assert!(result.found);
//! ```
//!
//! ## Coordinate Frame
//!
//! - Cell `(col, row)` has its centre at `(col * resolution, row * resolution)`
//! - Positions use the same length unit as the resolution
//! - Cells are 8-connected; a diagonal step costs `resolution * √2`
//!
//! ## Architecture
//!
//! - [`core`]: Cell and WorldPoint types
//! - [`world`]: Grid bounds and the mutable mine set
//! - [`costmap`]: FREE/BLOCKED map derived from a mine snapshot, plus halo
//! - [`planning`]: A* search, path simplification and corridor sweeps
//! - [`error`]: Typed errors for the above

pub mod core;
pub mod costmap;
pub mod error;
pub mod planning;
pub mod world;

pub use core::{Cell, WorldPoint};
pub use costmap::{CellStatus, TraversabilityMap, compute_traversability};
pub use error::{Endpoint, GridError, PlanError};
pub use planning::{
    AStarPlanner, CancelToken, PathResult, PlannerConfig, corridor_sweep, find_path,
    simplify_path,
};
pub use world::{Grid, Mine, MineInsert, World};
