//! Waypoint reduction for grid paths.

use crate::core::Cell;
use crate::costmap::TraversabilityMap;

/// Drop intermediate cells that a straight line can skip.
///
/// Walks the path greedily: from each retained cell, the furthest later
/// cell with clear line-of-sight becomes the next waypoint. Start and goal
/// are always kept, and every segment between consecutive waypoints crosses
/// only FREE cells.
pub fn simplify_path(map: &TraversabilityMap, path: &[Cell]) -> Vec<Cell> {
    if path.len() <= 2 {
        return path.to_vec();
    }

    let mut waypoints = vec![path[0]];
    let mut anchor = 0;

    while anchor < path.len() - 1 {
        let mut next = anchor + 1;
        for candidate in (anchor + 2..path.len()).rev() {
            if map.line_of_sight(path[anchor], path[candidate]) {
                next = candidate;
                break;
            }
        }
        waypoints.push(path[next]);
        anchor = next;
    }

    waypoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WorldPoint;
    use crate::planning::find_path;
    use crate::world::World;

    #[test]
    fn test_straight_path_collapses() {
        let map = World::configure(10, 10, 1.0).unwrap().traversability(0.0);
        let path: Vec<Cell> = (0..10).map(|x| Cell::new(x, 0)).collect();

        assert_eq!(
            simplify_path(&map, &path),
            vec![Cell::new(0, 0), Cell::new(9, 0)]
        );
    }

    #[test]
    fn test_short_paths_unchanged() {
        let map = World::configure(3, 3, 1.0).unwrap().traversability(0.0);
        assert!(simplify_path(&map, &[]).is_empty());
        assert_eq!(simplify_path(&map, &[Cell::new(1, 1)]), vec![Cell::new(1, 1)]);
    }

    #[test]
    fn test_detour_keeps_corners() {
        let mut world = World::configure(10, 10, 1.0).unwrap();
        world.add_mine(WorldPoint::new(5.0, 5.0), 2.0).unwrap();
        let map = world.traversability(0.0);

        let result = find_path(&map, Cell::new(0, 5), Cell::new(9, 5)).unwrap();
        let waypoints = simplify_path(&map, &result.path);

        assert!(waypoints.len() >= 3);
        assert!(waypoints.len() < result.path.len());
        assert_eq!(waypoints.first(), result.path.first());
        assert_eq!(waypoints.last(), result.path.last());
        for pair in waypoints.windows(2) {
            assert!(map.line_of_sight(pair[0], pair[1]));
        }
    }
}
