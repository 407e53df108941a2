//! Tactical pathfinding
//!
//! A* over a navigation grid coarser than the collision grid, followed by
//! string-pulling sized to the agent's body.

pub mod astar;
pub mod plan;
pub mod smoothing;

pub use astar::{find_raw_path, PathRequest};
pub use plan::PathPlan;
pub use smoothing::{corridor_clear, string_pull};

use crate::core::config::PathfindingConfig;
use crate::core::types::Vec2;
use crate::map::WorldGrid;

/// Smoothed waypoints from `request.start` to `request.goal`, start excluded.
/// Empty when no route exists.
pub fn find_path(grid: &WorldGrid, request: &PathRequest, config: &PathfindingConfig) -> Vec<Vec2> {
    let raw = find_raw_path(grid, request, config);
    if raw.is_empty() {
        return raw;
    }
    string_pull(grid, request.start, &raw, request.radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::TileKind;

    fn request(start: Vec2, goal: Vec2) -> PathRequest<'static> {
        PathRequest {
            start,
            goal,
            radius: 6.0,
            prefers_stealth: false,
            heat: None,
        }
    }

    #[test]
    fn test_unobstructed_path_has_at_most_two_waypoints() {
        let grid = WorldGrid::new(120, 80, 4.0, 2.0);
        let config = PathfindingConfig::default();
        for (start, goal) in [
            (Vec2::new(20.0, 20.0), Vec2::new(460.0, 300.0)),
            (Vec2::new(400.0, 40.0), Vec2::new(30.0, 290.0)),
            (Vec2::new(240.0, 160.0), Vec2::new(250.0, 10.0)),
        ] {
            let path = find_path(&grid, &request(start, goal), &config);
            assert!(!path.is_empty());
            assert!(path.len() <= 2, "got {} waypoints", path.len());
            assert_eq!(*path.last().unwrap(), goal);
        }
    }

    #[test]
    fn test_sealed_goal_returns_empty_within_budget() {
        let mut grid = WorldGrid::new(120, 80, 4.0, 2.0);
        // Box the goal in completely
        for i in 60..=80 {
            grid.paint(i, 20, TileKind::Wall);
            grid.paint(i, 40, TileKind::Wall);
            grid.paint(60, i - 40, TileKind::Wall);
            grid.paint(80, i - 40, TileKind::Wall);
        }
        let path = find_path(
            &grid,
            &request(Vec2::new(20.0, 20.0), Vec2::new(280.0, 120.0)),
            &PathfindingConfig::default(),
        );
        assert!(path.is_empty());
    }

    #[test]
    fn test_smoothed_path_is_shorter_than_raw() {
        let mut grid = WorldGrid::new(120, 80, 4.0, 2.0);
        for y in 0..50 {
            grid.paint(60, y, TileKind::Wall);
        }
        let req = request(Vec2::new(40.0, 40.0), Vec2::new(440.0, 40.0));
        let config = PathfindingConfig::default();
        let raw = find_raw_path(&grid, &req, &config);
        let smooth = find_path(&grid, &req, &config);
        assert!(!smooth.is_empty());
        assert!(smooth.len() < raw.len());
        assert_eq!(smooth.last(), raw.last());
    }
}
