//! Cell and world-point types for the mine grid.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Integer grid cell `(col, row)`.
///
/// Serialized as `{"x": col, "y": row}` to match the event protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Column index
    pub x: i32,
    /// Row index
    pub y: i32,
}

/// Unit steps of the 8-connected grid, axis-aligned moves first.
///
/// The order is fixed: it decides which of several equal-cost
/// neighbours enters the frontier first.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
    (1, -1),
];

impl Cell {
    /// Create a new cell
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance (max of x and y distance) - used for 8-connected grids
    #[inline]
    pub fn chebyshev_distance(&self, other: &Cell) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Euclidean distance in cell units
    #[inline]
    pub fn euclidean_distance(&self, other: &Cell) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// True if `other` is one 8-connected step away
    #[inline]
    pub fn is_adjacent(&self, other: &Cell) -> bool {
        self.chebyshev_distance(other) == 1
    }

    /// Cells on the Bresenham line from `self` to `other`, both inclusive.
    ///
    /// Consecutive cells are 8-connected.
    pub fn line_to(&self, other: &Cell) -> Vec<Cell> {
        let (mut x, mut y) = (self.x, self.y);
        let dx = (other.x - x).abs();
        let dy = (other.y - y).abs();
        let sx = if x < other.x { 1 } else { -1 };
        let sy = if y < other.y { 1 } else { -1 };
        let mut err = dx - dy;

        let mut cells = Vec::with_capacity(dx.max(dy) as usize + 1);
        loop {
            cells.push(Cell::new(x, y));
            if x == other.x && y == other.y {
                break;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
        cells
    }

    /// Get the 8 neighbors in [`NEIGHBOR_OFFSETS`] order
    #[inline]
    pub fn neighbors_8(&self) -> [Cell; 8] {
        NEIGHBOR_OFFSETS.map(|(dx, dy)| Cell::new(self.x + dx, self.y + dy))
    }
}

impl Add for Cell {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Cell::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Cell {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Cell::new(self.x - other.x, self.y - other.y)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Real-world position, in the same length unit as the grid resolution
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl WorldPoint {
    /// Create a new world point
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero point (origin)
    pub const ZERO: WorldPoint = WorldPoint { x: 0.0, y: 0.0 };

    /// Euclidean distance to another point
    #[inline]
    pub fn distance(&self, other: &WorldPoint) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Squared distance (faster, avoids sqrt)
    #[inline]
    pub fn distance_squared(&self, other: &WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// True if both components are finite
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::fmt::Display for WorldPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

impl Add for WorldPoint {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        WorldPoint::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for WorldPoint {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        WorldPoint::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for WorldPoint {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f32) -> Self {
        WorldPoint::new(self.x * scalar, self.y * scalar)
    }
}
