//! Foundation types shared by the world model, cost layer and planner.
//!
//! - [`Cell`]: integer `(col, row)` grid address
//! - [`WorldPoint`]: real-valued position in the resolution's length unit

mod point;

pub use point::{Cell, NEIGHBOR_OFFSETS, WorldPoint};
