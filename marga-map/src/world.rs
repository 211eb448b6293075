//! Grid bounds and the mutable mine set of one mission.
//!
//! The [`Grid`] is fixed once configured. The [`World`] owns the grid plus
//! the mines added during the mission; every traversability map is derived
//! from a `World` on demand and never cached across mutations.

use serde::Serialize;

use crate::core::{Cell, WorldPoint};
use crate::costmap::TraversabilityMap;
use crate::error::GridError;

/// Two mines closer than this are the same mine.
pub const MINE_EPSILON: f32 = 1e-6;

/// Upper bound on `width * height`, keeps a bad `configure` from
/// allocating gigabytes.
pub const MAX_GRID_CELLS: usize = 1 << 24;

/// Immutable grid dimensions and resolution.
///
/// Cell `(c, r)` has its centre at `(c * resolution, r * resolution)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Grid {
    width: usize,
    height: usize,
    resolution: f32,
}

impl Grid {
    /// Validate and create a grid.
    ///
    /// Dimensions are taken as signed so that negative input is reported
    /// as a configuration error rather than wrapping.
    pub fn new(width_cells: i64, height_cells: i64, resolution: f32) -> Result<Self, GridError> {
        if width_cells <= 0 || height_cells <= 0 {
            return Err(GridError::InvalidConfig(format!(
                "dimensions must be positive, got {}x{}",
                width_cells, height_cells
            )));
        }
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(GridError::InvalidConfig(format!(
                "resolution must be a positive number, got {}",
                resolution
            )));
        }
        let width = width_cells as usize;
        let height = height_cells as usize;
        if width.saturating_mul(height) > MAX_GRID_CELLS {
            return Err(GridError::InvalidConfig(format!(
                "{}x{} exceeds the {} cell limit",
                width, height, MAX_GRID_CELLS
            )));
        }

        Ok(Self {
            width,
            height,
            resolution,
        })
    }

    /// Width in cells
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Distance per cell edge
    #[inline]
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    /// Total number of cells
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// True if the cell lies inside the grid
    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.height
    }

    /// Row-major index of an in-bounds cell
    #[inline]
    pub fn index(&self, cell: Cell) -> Option<usize> {
        if self.contains(cell) {
            Some(cell.y as usize * self.width + cell.x as usize)
        } else {
            None
        }
    }

    /// Inverse of [`Grid::index`]
    #[inline]
    pub fn cell_at(&self, index: usize) -> Cell {
        Cell::new((index % self.width) as i32, (index / self.width) as i32)
    }

    /// Position of a cell's centre
    #[inline]
    pub fn cell_to_position(&self, cell: Cell) -> WorldPoint {
        WorldPoint::new(
            cell.x as f32 * self.resolution,
            cell.y as f32 * self.resolution,
        )
    }

    /// Nearest cell to a position, failing if it falls outside the grid.
    pub fn position_to_cell(&self, position: WorldPoint) -> Result<Cell, GridError> {
        let out_of_bounds = || GridError::OutOfBounds {
            position,
            width: self.width,
            height: self.height,
        };

        if !position.is_finite() {
            return Err(out_of_bounds());
        }

        let col = (position.x / self.resolution).round();
        let row = (position.y / self.resolution).round();
        if col < 0.0 || row < 0.0 || col >= self.width as f32 || row >= self.height as f32 {
            return Err(out_of_bounds());
        }

        Ok(Cell::new(col as i32, row as i32))
    }

    /// All cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.cell_count()).map(|i| self.cell_at(i))
    }
}

/// A known mine with its avoidance buffer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Mine {
    /// Position in the grid's length unit
    pub position: WorldPoint,
    /// Minimum clearance a path must keep
    pub avoidance_radius: f32,
    /// Set once the drone has passed within sensor range
    pub detected: bool,
}

impl Mine {
    /// Create an undetected mine
    pub fn new(position: WorldPoint, avoidance_radius: f32) -> Self {
        Self {
            position,
            avoidance_radius,
            detected: false,
        }
    }

    /// True if `point` lies inside this mine's buffer (boundary included)
    #[inline]
    pub fn covers(&self, point: WorldPoint) -> bool {
        self.position.distance_squared(&point) <= self.avoidance_radius * self.avoidance_radius
    }

    fn same_position(&self, position: WorldPoint) -> bool {
        self.position.distance(&position) <= MINE_EPSILON
    }
}

/// Outcome of [`World::add_mine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MineInsert {
    /// New mine stored
    Added,
    /// An equivalent mine exists; its radius was widened
    Widened,
    /// An equivalent mine exists; nothing changed
    Duplicate,
}

/// Grid plus mine set, owned by a single session.
#[derive(Clone, Debug)]
pub struct World {
    grid: Grid,
    mines: Vec<Mine>,
}

impl World {
    /// Empty world over a grid
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            mines: Vec::new(),
        }
    }

    /// Validate dimensions and create an empty world
    pub fn configure(
        width_cells: i64,
        height_cells: i64,
        resolution: f32,
    ) -> Result<Self, GridError> {
        Ok(Self::new(Grid::new(width_cells, height_cells, resolution)?))
    }

    /// Grid bounds
    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Current mine set
    #[inline]
    pub fn mines(&self) -> &[Mine] {
        &self.mines
    }

    /// Insert a mine.
    ///
    /// A mine at an existing position is not stored twice; if its radius
    /// is larger the stored one is widened, so the blocked set is the same
    /// as if only the larger mine had been added.
    pub fn add_mine(&mut self, position: WorldPoint, radius: f32) -> Result<MineInsert, GridError> {
        self.validate_mine(position, radius)?;
        Ok(self.insert_unchecked(Mine::new(position, radius)))
    }

    /// Replace the whole mine set.
    ///
    /// All mines are validated before any change, so a bad entry leaves the
    /// previous set intact.
    pub fn set_mines(&mut self, mines: &[(WorldPoint, f32)]) -> Result<usize, GridError> {
        for &(position, radius) in mines {
            self.validate_mine(position, radius)?;
        }

        self.mines.clear();
        for &(position, radius) in mines {
            self.insert_unchecked(Mine::new(position, radius));
        }
        Ok(self.mines.len())
    }

    /// Add a mine discovered during execution, flagged as detected.
    pub fn reveal_mine(&mut self, position: WorldPoint, radius: f32) -> Result<MineInsert, GridError> {
        self.validate_mine(position, radius)?;
        let mut mine = Mine::new(position, radius);
        mine.detected = true;
        Ok(self.insert_unchecked(mine))
    }

    /// Clear the mine set; the grid is kept.
    pub fn remove_all_mines(&mut self) {
        self.mines.clear();
    }

    /// Flag every mine within `range` of any of `cells` as detected.
    ///
    /// Returns the indices of mines that were newly flagged.
    pub fn mark_detected_near(&mut self, cells: &[Cell], range: f32) -> Vec<usize> {
        let range_sq = range * range;
        let positions: Vec<WorldPoint> = cells
            .iter()
            .map(|&c| self.grid.cell_to_position(c))
            .collect();

        let mut newly = Vec::new();
        for (i, mine) in self.mines.iter_mut().enumerate() {
            if mine.detected {
                continue;
            }
            if positions
                .iter()
                .any(|p| p.distance_squared(&mine.position) <= range_sq)
            {
                mine.detected = true;
                newly.push(i);
            }
        }
        newly
    }

    /// Flag the mine stored at `position` as detected.
    ///
    /// Returns false if no such mine exists.
    pub fn mark_detected_at(&mut self, position: WorldPoint) -> bool {
        match self.mines.iter_mut().find(|m| m.same_position(position)) {
            Some(mine) => {
                mine.detected = true;
                true
            }
            None => false,
        }
    }

    /// Derive the traversability map from the current mine set.
    pub fn traversability(&self, halo_distance: f32) -> TraversabilityMap {
        TraversabilityMap::from_world(&self.grid, &self.mines, halo_distance)
    }

    fn validate_mine(&self, position: WorldPoint, radius: f32) -> Result<(), GridError> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(GridError::InvalidRadius(radius));
        }
        self.grid.position_to_cell(position).map(|_| ())
    }

    fn insert_unchecked(&mut self, mine: Mine) -> MineInsert {
        if let Some(existing) = self
            .mines
            .iter_mut()
            .find(|m| m.same_position(mine.position))
        {
            existing.detected |= mine.detected;
            if mine.avoidance_radius > existing.avoidance_radius {
                existing.avoidance_radius = mine.avoidance_radius;
                return MineInsert::Widened;
            }
            return MineInsert::Duplicate;
        }

        self.mines.push(mine);
        MineInsert::Added
    }
}
