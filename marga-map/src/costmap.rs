//! Traversability map with mine buffers and a soft clearance halo.
//!
//! Every cell is either FREE or BLOCKED. A cell is BLOCKED iff its centre
//! lies within some mine's avoidance radius. On top of that hard layer, a
//! brushfire distance field from the blocked cells gives each free cell a
//! penalty in `[0, 1]` when it sits inside the halo, which the planner can
//! weigh to prefer routes further back from mines.

use std::collections::VecDeque;

use crate::core::{Cell, WorldPoint};
use crate::world::{Grid, Mine};

/// Hard status of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellStatus {
    /// Outside every avoidance buffer
    Free,
    /// Inside at least one avoidance buffer
    Blocked,
}

/// Derived FREE/BLOCKED classification plus clearance field.
///
/// Built from a grid and a mine slice; holds no reference to either, so a
/// map is an immutable snapshot of the mine set it was built from.
#[derive(Clone, Debug, PartialEq)]
pub struct TraversabilityMap {
    grid: Grid,
    status: Vec<CellStatus>,
    /// Distance to nearest blocked cell, in cells (`f32::MAX` if none)
    clearance: Vec<f32>,
    /// Halo width in cells
    halo_cells: f32,
    blocked: usize,
}

/// Compute the hard traversability map of `grid` under `mines`.
///
/// Pure function of its inputs; no halo penalties.
pub fn compute_traversability(grid: &Grid, mines: &[Mine]) -> TraversabilityMap {
    TraversabilityMap::from_world(grid, mines, 0.0)
}

impl TraversabilityMap {
    /// Build the map.
    ///
    /// # Arguments
    /// * `grid` - Grid bounds and resolution
    /// * `mines` - Mine snapshot
    /// * `halo_distance` - Width of the soft-penalty band beyond blocked cells,
    ///   in the resolution's length unit (0 disables penalties)
    pub fn from_world(grid: &Grid, mines: &[Mine], halo_distance: f32) -> Self {
        let total_cells = grid.cell_count();
        let mut status = vec![CellStatus::Free; total_cells];

        for mine in mines {
            Self::stamp_mine(grid, mine, &mut status);
        }

        let mut clearance = vec![f32::MAX; total_cells];
        let mut queue = VecDeque::new();
        let mut blocked = 0;
        for (idx, s) in status.iter().enumerate() {
            if *s == CellStatus::Blocked {
                clearance[idx] = 0.0;
                queue.push_back(grid.cell_at(idx));
                blocked += 1;
            }
        }

        Self::compute_distance_field_brushfire(&mut clearance, grid, &mut queue);

        let halo_cells = if halo_distance.is_finite() && halo_distance > 0.0 {
            halo_distance / grid.resolution()
        } else {
            0.0
        };

        log::debug!(
            "Traversability: {} of {} cells blocked by {} mines",
            blocked,
            total_cells,
            mines.len()
        );

        Self {
            grid: *grid,
            status,
            clearance,
            halo_cells,
            blocked,
        }
    }

    /// Mark every cell whose centre lies inside the mine's buffer.
    ///
    /// Only the bounding box of the buffer is visited.
    fn stamp_mine(grid: &Grid, mine: &Mine, status: &mut [CellStatus]) {
        let res = grid.resolution();
        let r = mine.avoidance_radius;

        let min_col = ((mine.position.x - r) / res).floor().max(0.0);
        let max_col = ((mine.position.x + r) / res).ceil();
        let min_row = ((mine.position.y - r) / res).floor().max(0.0);
        let max_row = ((mine.position.y + r) / res).ceil();
        if max_col < 0.0 || max_row < 0.0 {
            return;
        }

        let max_col = (max_col as usize).min(grid.width() - 1);
        let max_row = (max_row as usize).min(grid.height() - 1);

        for row in min_row as usize..=max_row {
            for col in min_col as usize..=max_col {
                let cell = Cell::new(col as i32, row as i32);
                if mine.covers(grid.cell_to_position(cell)) {
                    status[row * grid.width() + col] = CellStatus::Blocked;
                }
            }
        }
    }

    /// Compute distance field using Brushfire (BFS) algorithm.
    fn compute_distance_field_brushfire(
        distance_field: &mut [f32],
        grid: &Grid,
        queue: &mut VecDeque<Cell>,
    ) {
        let sqrt2 = std::f32::consts::SQRT_2;

        // 8-connected neighbors with distances
        let neighbors = [
            (-1, 0, 1.0),
            (1, 0, 1.0),
            (0, -1, 1.0),
            (0, 1, 1.0),
            (-1, -1, sqrt2),
            (1, -1, sqrt2),
            (-1, 1, sqrt2),
            (1, 1, sqrt2),
        ];

        while let Some(cell) = queue.pop_front() {
            let Some(current_idx) = grid.index(cell) else {
                continue;
            };
            let current_dist = distance_field[current_idx];

            for &(dx, dy, cost) in &neighbors {
                let neighbor = Cell::new(cell.x + dx, cell.y + dy);
                let Some(neighbor_idx) = grid.index(neighbor) else {
                    continue;
                };

                let new_dist = current_dist + cost;
                if new_dist < distance_field[neighbor_idx] {
                    distance_field[neighbor_idx] = new_dist;
                    queue.push_back(neighbor);
                }
            }
        }
    }

    /// Grid the map was built over
    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Status of a cell; out-of-bounds cells are `None`.
    #[inline]
    pub fn status(&self, cell: Cell) -> Option<CellStatus> {
        self.grid.index(cell).map(|i| self.status[i])
    }

    /// True if the cell is in bounds and FREE
    #[inline]
    pub fn is_free(&self, cell: Cell) -> bool {
        self.status(cell) == Some(CellStatus::Free)
    }

    /// Status by row-major index
    #[inline]
    pub(crate) fn status_at(&self, index: usize) -> CellStatus {
        self.status[index]
    }

    /// Distance from the cell to the nearest blocked cell, in cells.
    ///
    /// `f32::MAX` when there are no blocked cells; `0.0` out of bounds.
    #[inline]
    pub fn clearance(&self, cell: Cell) -> f32 {
        self.grid.index(cell).map_or(0.0, |i| self.clearance[i])
    }

    /// Halo penalty in `[0, 1]`: 0 outside the halo, approaching 1 next to
    /// a blocked cell.
    #[inline]
    pub fn penalty(&self, cell: Cell) -> f32 {
        self.grid
            .index(cell)
            .map_or(0.0, |i| self.penalty_at(i))
    }

    #[inline]
    pub(crate) fn penalty_at(&self, index: usize) -> f32 {
        if self.halo_cells <= 0.0 {
            return 0.0;
        }
        let dist = self.clearance[index];
        if dist <= 0.0 || dist > self.halo_cells {
            0.0
        } else {
            (self.halo_cells - dist) / self.halo_cells
        }
    }

    /// True if a halo is configured
    #[inline]
    pub fn has_halo(&self) -> bool {
        self.halo_cells > 0.0
    }

    /// Number of BLOCKED cells
    #[inline]
    pub fn blocked_count(&self) -> usize {
        self.blocked
    }

    /// Position of a cell's centre
    #[inline]
    pub fn cell_to_position(&self, cell: Cell) -> WorldPoint {
        self.grid.cell_to_position(cell)
    }

    /// Check if line-of-sight is clear between two cells.
    ///
    /// Every cell on the Bresenham line must be FREE.
    pub fn line_of_sight(&self, from: Cell, to: Cell) -> bool {
        from.line_to(&to).into_iter().all(|c| self.is_free(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::World;

    fn world_with_mine(x: f32, y: f32, r: f32) -> World {
        let mut world = World::configure(10, 10, 1.0).unwrap();
        world.add_mine(WorldPoint::new(x, y), r).unwrap();
        world
    }

    #[test]
    fn test_blocked_iff_within_radius() {
        let world = world_with_mine(5.0, 5.0, 2.0);
        let map = compute_traversability(world.grid(), world.mines());

        for cell in world.grid().cells() {
            let d = world.grid().cell_to_position(cell).distance(&WorldPoint::new(5.0, 5.0));
            let expected = if d <= 2.0 {
                CellStatus::Blocked
            } else {
                CellStatus::Free
            };
            assert_eq!(map.status(cell), Some(expected), "cell {}", cell);
        }

        // Boundary is inclusive
        assert!(!map.is_free(Cell::new(3, 5)));
        assert!(map.is_free(Cell::new(3, 4)));
    }

    #[test]
    fn test_border_cells_not_special() {
        let world = world_with_mine(0.0, 0.0, 1.0);
        let map = compute_traversability(world.grid(), world.mines());

        assert!(!map.is_free(Cell::new(0, 0)));
        assert!(!map.is_free(Cell::new(1, 0)));
        assert!(!map.is_free(Cell::new(0, 1)));
        assert!(map.is_free(Cell::new(1, 1)));
        assert_eq!(map.blocked_count(), 3);
    }

    #[test]
    fn test_out_of_bounds_status() {
        let map = compute_traversability(World::configure(4, 4, 1.0).unwrap().grid(), &[]);
        assert_eq!(map.status(Cell::new(-1, 0)), None);
        assert!(!map.is_free(Cell::new(4, 0)));
        assert_eq!(map.blocked_count(), 0);
    }

    #[test]
    fn test_distance_field() {
        let world = world_with_mine(5.0, 5.0, 0.0);
        let map = world.traversability(0.0);

        assert_eq!(map.clearance(Cell::new(5, 5)), 0.0);
        assert!((map.clearance(Cell::new(5, 6)) - 1.0).abs() < 1e-6);
        assert!((map.clearance(Cell::new(6, 6)) - std::f32::consts::SQRT_2).abs() < 1e-6);
        assert!(map.clearance(Cell::new(0, 0)) > 5.0);
    }

    #[test]
    fn test_halo_penalty() {
        let world = world_with_mine(5.0, 5.0, 0.0);

        let plain = world.traversability(0.0);
        assert!(!plain.has_halo());
        assert_eq!(plain.penalty(Cell::new(5, 6)), 0.0);

        let halo = world.traversability(3.0);
        assert!(halo.has_halo());
        let near = halo.penalty(Cell::new(5, 6));
        let mid = halo.penalty(Cell::new(5, 7));
        assert!(near > mid && mid > 0.0);
        assert_eq!(halo.penalty(Cell::new(5, 9)), 0.0);
        // Blocked cell carries no penalty, it is excluded outright
        assert_eq!(halo.penalty(Cell::new(5, 5)), 0.0);
        // Halo never changes the hard layer
        assert_eq!(plain.blocked_count(), halo.blocked_count());
    }

    #[test]
    fn test_line_of_sight() {
        let world = world_with_mine(5.0, 5.0, 1.0);
        let map = world.traversability(0.0);

        assert!(map.line_of_sight(Cell::new(0, 0), Cell::new(9, 0)));
        assert!(!map.line_of_sight(Cell::new(0, 5), Cell::new(9, 5)));
        assert!(!map.line_of_sight(Cell::new(5, 0), Cell::new(5, 9)));
    }

    #[test]
    fn test_mine_outside_stamp_range() {
        // Mine near the far corner, radius reaching past the edge
        let mut world = World::configure(5, 5, 1.0).unwrap();
        world.add_mine(WorldPoint::new(4.0, 4.0), 1.5).unwrap();
        let map = world.traversability(0.0);

        assert!(!map.is_free(Cell::new(4, 4)));
        assert!(!map.is_free(Cell::new(3, 3)));
        assert!(map.is_free(Cell::new(2, 4)));
    }
}
