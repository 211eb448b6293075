//! Error types for the world model and search engine.

use thiserror::Error;

use crate::core::{Cell, WorldPoint};

/// Errors raised by [`Grid`](crate::world::Grid) and [`World`](crate::world::World).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// Non-positive dimensions or resolution at configure time
    #[error("invalid grid configuration: {0}")]
    InvalidConfig(String),

    /// A position maps outside the grid extent
    #[error("position {position} is outside the {width}x{height} grid")]
    OutOfBounds {
        /// Offending position
        position: WorldPoint,
        /// Grid width in cells
        width: usize,
        /// Grid height in cells
        height: usize,
    },

    /// Mine radius is negative or not finite
    #[error("invalid mine radius {0}")]
    InvalidRadius(f32),
}

/// Which end of a path request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Start cell
    Start,
    /// Goal cell
    Goal,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Start => write!(f, "start"),
            Endpoint::Goal => write!(f, "goal"),
        }
    }
}

/// Errors raised by the search engine.
///
/// An unreachable goal is not an error; it is a
/// [`PathResult`](crate::planning::PathResult) with `found == false`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Start or goal lies inside a mine's avoidance buffer
    #[error("{endpoint} cell {cell} is inside a mine avoidance buffer")]
    InvalidEndpoint {
        /// Which endpoint
        endpoint: Endpoint,
        /// The blocked cell
        cell: Cell,
    },

    /// Start or goal is outside the grid
    #[error("{endpoint} cell {cell} is outside the {width}x{height} grid")]
    OutOfBounds {
        /// Which endpoint
        endpoint: Endpoint,
        /// The offending cell
        cell: Cell,
        /// Grid width in cells
        width: usize,
        /// Grid height in cells
        height: usize,
    },

    /// The cancel token fired before the search finished
    #[error("search cancelled after {expansions} expansions")]
    Cancelled {
        /// Nodes expanded before stopping
        expansions: usize,
    },

    /// The node-expansion cap was reached
    #[error("search exceeded {limit} node expansions")]
    SearchLimit {
        /// Configured cap
        limit: usize,
    },
}
