//! String-pulling over a raw grid path

use crate::core::types::Vec2;
use crate::map::WorldGrid;

/// Is the corridor of width `2 * radius` from `a` to `b` free of movement
/// blockers? Checked along three parallel rays (center and both edges).
pub fn corridor_clear(grid: &WorldGrid, a: Vec2, b: Vec2, radius: f32) -> bool {
    let dir = (b - a).normalize_or_zero();
    if dir == Vec2::ZERO {
        return true;
    }
    let side = dir.perp() * radius;
    grid.segment_clear(a, b)
        && grid.segment_clear(a + side, b + side)
        && grid.segment_clear(a - side, b - side)
}

/// Collapse a raw path into the fewest waypoints the corridor allows
///
/// From the current anchor, the visible stretch is extended forward while
/// the corridor to the next raw point stays clear; a waypoint is emitted
/// where it stops. The final goal is always kept.
pub fn string_pull(grid: &WorldGrid, start: Vec2, raw: &[Vec2], radius: f32) -> Vec<Vec2> {
    let mut waypoints = Vec::new();
    let mut anchor = start;
    let mut i = 0;

    while i < raw.len() {
        let mut furthest = i;
        for (j, point) in raw.iter().enumerate().skip(i) {
            if corridor_clear(grid, anchor, *point, radius) {
                furthest = j;
            } else {
                break;
            }
        }
        waypoints.push(raw[furthest]);
        anchor = raw[furthest];
        i = furthest + 1;
    }
    waypoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::TileKind;

    #[test]
    fn test_open_ground_collapses_to_goal() {
        let grid = WorldGrid::new(100, 100, 4.0, 2.0);
        let raw: Vec<Vec2> = (1..=20).map(|i| Vec2::new(20.0 + i as f32 * 16.0, 40.0)).collect();
        let smoothed = string_pull(&grid, Vec2::new(20.0, 40.0), &raw, 6.0);
        assert_eq!(smoothed, vec![*raw.last().unwrap()]);
    }

    #[test]
    fn test_corner_keeps_a_waypoint() {
        let mut grid = WorldGrid::new(100, 100, 4.0, 2.0);
        // Block the diagonal shortcut
        for y in 0..60 {
            for x in 30..60 {
                grid.paint(x, y, TileKind::Wall);
            }
        }
        let start = Vec2::new(60.0, 60.0);
        let corner = Vec2::new(60.0, 300.0);
        let goal = Vec2::new(340.0, 300.0);
        let raw = vec![Vec2::new(60.0, 180.0), corner, Vec2::new(200.0, 300.0), goal];
        let smoothed = string_pull(&grid, start, &raw, 6.0);
        assert!(smoothed.len() >= 2);
        assert_eq!(*smoothed.last().unwrap(), goal);
    }

    #[test]
    fn test_corridor_checks_edges() {
        let mut grid = WorldGrid::new(100, 100, 4.0, 2.0);
        // A post just off the center line
        grid.paint(25, 12, TileKind::Wall);
        let a = Vec2::new(20.0, 44.0);
        let b = Vec2::new(200.0, 44.0);
        assert!(grid.segment_clear(a, b));
        assert!(!corridor_clear(&grid, a, b, 6.0));
    }
}
