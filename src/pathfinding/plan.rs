//! Per-agent active path with a re-plan policy

use std::collections::VecDeque;

use tracing::debug;

use crate::core::config::PathfindingConfig;
use crate::core::types::Vec2;
use crate::map::WorldGrid;
use crate::pathfinding::{find_path, PathRequest};

#[derive(Debug, Clone, Default)]
pub struct PathPlan {
    waypoints: VecDeque<Vec2>,
    planned_target: Option<Vec2>,
}

impl PathPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no plan exists or the target drifted beyond tolerance
    pub fn needs_replan(&self, target: Vec2, tolerance: f32) -> bool {
        match self.planned_target {
            Some(planned) => planned.distance(target) > tolerance,
            None => true,
        }
    }

    pub fn set(&mut self, target: Vec2, waypoints: Vec<Vec2>) {
        self.planned_target = Some(target);
        self.waypoints = waypoints.into();
    }

    pub fn clear(&mut self) {
        self.planned_target = None;
        self.waypoints.clear();
    }

    pub fn waypoints(&self) -> impl Iterator<Item = &Vec2> {
        self.waypoints.iter()
    }

    pub fn planned_target(&self) -> Option<Vec2> {
        self.planned_target
    }

    /// Drop reached waypoints and return the next one
    pub fn next_waypoint(&mut self, position: Vec2, reach: f32) -> Option<Vec2> {
        while let Some(front) = self.waypoints.front() {
            if front.distance(position) <= reach {
                self.waypoints.pop_front();
            } else {
                break;
            }
        }
        self.waypoints.front().copied()
    }

    /// Steering point toward `request.goal`, planning only when needed.
    ///
    /// An empty plan (no route, budget spent, or already arrived) falls back
    /// to steering straight at the goal.
    pub fn steer_point(
        &mut self,
        grid: &WorldGrid,
        request: &PathRequest,
        config: &PathfindingConfig,
    ) -> Vec2 {
        if self.needs_replan(request.goal, config.replan_tolerance) {
            let path = find_path(grid, request, config);
            if path.is_empty() {
                debug!(
                    "No path from {:?} to {:?}, steering directly",
                    request.start, request.goal
                );
            }
            self.set(request.goal, path);
        }
        self.next_waypoint(request.start, config.waypoint_reach)
            .unwrap_or(request.goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replan_only_beyond_tolerance() {
        let mut plan = PathPlan::new();
        assert!(plan.needs_replan(Vec2::ZERO, 10.0));
        plan.set(Vec2::new(100.0, 100.0), vec![Vec2::new(100.0, 100.0)]);
        assert!(!plan.needs_replan(Vec2::new(105.0, 100.0), 10.0));
        assert!(plan.needs_replan(Vec2::new(120.0, 100.0), 10.0));
    }

    #[test]
    fn test_reached_waypoints_are_dropped() {
        let mut plan = PathPlan::new();
        plan.set(
            Vec2::new(50.0, 0.0),
            vec![Vec2::new(10.0, 0.0), Vec2::new(50.0, 0.0)],
        );
        assert_eq!(
            plan.next_waypoint(Vec2::new(9.0, 0.0), 2.0),
            Some(Vec2::new(50.0, 0.0))
        );
        assert_eq!(plan.next_waypoint(Vec2::new(49.0, 0.0), 2.0), None);
    }

    #[test]
    fn test_steer_point_falls_back_to_goal() {
        let grid = WorldGrid::new(50, 50, 4.0, 2.0);
        let mut plan = PathPlan::new();
        let request = PathRequest {
            start: Vec2::new(20.0, 20.0),
            // Out of bounds: no path
            goal: Vec2::new(500.0, 20.0),
            radius: 6.0,
            prefers_stealth: false,
            heat: None,
        };
        let point = plan.steer_point(&grid, &request, &PathfindingConfig::default());
        assert_eq!(point, request.goal);
    }
}
