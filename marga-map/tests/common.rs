//! Test utilities for marga-map planning tests.
//!
//! This module provides reference connectivity checks, path validators and
//! mine-field builders.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::num::Wrapping;

use marga_map::{Cell, TraversabilityMap, World, WorldPoint};

/// Create an empty world with unit resolution.
pub fn open_world(width: i64, height: i64) -> World {
    World::configure(width, height, 1.0).unwrap()
}

/// Reference flood-fill: true if `goal` is reachable from `start` through
/// 8-connected FREE cells.
pub fn flood_fill_reachable(map: &TraversabilityMap, start: Cell, goal: Cell) -> bool {
    if !map.is_free(start) || !map.is_free(goal) {
        return false;
    }

    let grid = map.grid();
    let mut seen = vec![false; grid.cell_count()];
    let mut queue = VecDeque::new();

    if let Some(idx) = grid.index(start) {
        seen[idx] = true;
        queue.push_back(start);
    }

    while let Some(cell) = queue.pop_front() {
        if cell == goal {
            return true;
        }
        for n in cell.neighbors_8() {
            if let Some(idx) = grid.index(n)
                && !seen[idx]
                && map.is_free(n)
            {
                seen[idx] = true;
                queue.push_back(n);
            }
        }
    }

    false
}

/// Assert the path starts and ends where expected, moves by unit steps
/// and crosses only FREE cells.
pub fn assert_valid_path(map: &TraversabilityMap, path: &[Cell], start: Cell, goal: Cell) {
    assert_eq!(path.first(), Some(&start), "path must begin at start");
    assert_eq!(path.last(), Some(&goal), "path must end at goal");

    for cell in path {
        assert!(map.is_free(*cell), "path crosses blocked cell {}", cell);
    }
    for pair in path.windows(2) {
        assert!(
            pair[0].is_adjacent(&pair[1]),
            "non-adjacent step {} -> {}",
            pair[0],
            pair[1]
        );
    }
}

/// Sum of Euclidean step lengths along a path.
pub fn path_length(path: &[Cell], resolution: f32) -> f32 {
    path.windows(2)
        .map(|p| p[0].euclidean_distance(&p[1]) * resolution)
        .sum()
}

/// Place `count` mines at reproducible pseudo-random positions.
pub fn scatter_mines(world: &mut World, count: usize, radius: f32, seed: u64) {
    // Simple LCG PRNG for reproducibility
    let mut state = Wrapping(seed);
    let a = Wrapping(1664525u64);
    let c = Wrapping(1013904223u64);

    let width = world.grid().width() as f32;
    let height = world.grid().height() as f32;
    let res = world.grid().resolution();

    let mut random = || -> f32 {
        state = a * state + c;
        ((state.0 >> 16) & 0xFFFF) as f32 / 65536.0
    };

    for _ in 0..count {
        let x = (random() * (width - 1.0)).floor() * res;
        let y = (random() * (height - 1.0)).floor() * res;
        world.add_mine(WorldPoint::new(x, y), radius).unwrap();
    }
}

/// Surround `center` with a ring of zero-radius mines at Chebyshev
/// distance `ring`, leaving out the cells listed in `gaps`.
pub fn ring_of_mines(world: &mut World, center: Cell, ring: i32, gaps: &[Cell]) {
    let res = world.grid().resolution();
    for dy in -ring..=ring {
        for dx in -ring..=ring {
            if dx.abs() != ring && dy.abs() != ring {
                continue;
            }
            let cell = Cell::new(center.x + dx, center.y + dy);
            if gaps.contains(&cell) || !world.grid().contains(cell) {
                continue;
            }
            world
                .add_mine(WorldPoint::new(cell.x as f32 * res, cell.y as f32 * res), 0.0)
                .unwrap();
        }
    }
}
