//! Corridor sweep: a snake-pattern survey between two cells.
//!
//! The corridor is covered by parallel lanes along the start-goal line,
//! flown alternately forwards and backwards so that the end of one lane is
//! next to the start of the following one.

use crate::core::Cell;
use crate::world::Grid;

/// Survey pattern for the corridor from `start` to `goal`.
///
/// `lanes` passes are laid `lane_spacing` cells apart, centred on the
/// start-goal line; odd lanes run from the goal end back to the start end.
/// Lane ends are clamped into the grid and lanes are joined by straight
/// connectors. The pattern begins at `start` and every pair of consecutive
/// cells is 8-connected.
pub fn corridor_sweep(
    grid: &Grid,
    start: Cell,
    goal: Cell,
    lanes: usize,
    lane_spacing: u32,
) -> Vec<Cell> {
    let start = clamp(grid, start);
    let goal = clamp(grid, goal);
    let mut pattern = vec![start];
    if start == goal {
        return pattern;
    }

    let dx = (goal.x - start.x) as f32;
    let dy = (goal.y - start.y) as f32;
    let length = (dx * dx + dy * dy).sqrt();
    let (perp_x, perp_y) = (-dy / length, dx / length);

    let lanes = lanes.max(1);
    let centre = (lanes - 1) as f32 / 2.0;

    for lane in 0..lanes {
        let offset = (lane as f32 - centre) * lane_spacing as f32;
        let shift = Cell::new(
            (perp_x * offset).round() as i32,
            (perp_y * offset).round() as i32,
        );

        let mut from = clamp(grid, start + shift);
        let mut to = clamp(grid, goal + shift);
        if lane % 2 == 1 {
            std::mem::swap(&mut from, &mut to);
        }

        if let Some(&last) = pattern.last() {
            append(&mut pattern, last.line_to(&from));
        }
        append(&mut pattern, from.line_to(&to));
    }

    log::debug!(
        "Corridor sweep {} -> {}: {} lanes, {} cells",
        start,
        goal,
        lanes,
        pattern.len()
    );
    pattern
}

fn clamp(grid: &Grid, cell: Cell) -> Cell {
    let max_x = grid.width() as i32 - 1;
    let max_y = grid.height() as i32 - 1;
    Cell::new(cell.x.clamp(0, max_x), cell.y.clamp(0, max_y))
}

/// Append a segment, dropping cells that repeat the current tail.
fn append(pattern: &mut Vec<Cell>, segment: Vec<Cell>) {
    for cell in segment {
        if pattern.last() != Some(&cell) {
            pattern.push(cell);
        }
    }
}
