//! A* over the coarse navigation grid
//!
//! Respects heat, bush cost and the agent's collision footprint.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use tracing::debug;

use crate::core::config::PathfindingConfig;
use crate::core::types::Vec2;
use crate::map::WorldGrid;
use crate::perception::HeatGrid;
use crate::spatial::Grid;

/// Per-request search parameters
#[derive(Debug, Clone, Copy)]
pub struct PathRequest<'a> {
    pub start: Vec2,
    pub goal: Vec2,
    /// Body radius used for footprint checks
    pub radius: f32,
    /// Stealthy agents pay no extra for bushes
    pub prefers_stealth: bool,
    /// The requester's private heat map
    pub heat: Option<&'a HeatGrid>,
}

/// Node in the A* open set
#[derive(Debug, Clone, Copy)]
struct PathNode {
    cell: (i32, i32),
    f_cost: OrderedFloat<f32>,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other.f_cost.cmp(&self.f_cost)
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum Footprint {
    #[default]
    Unknown,
    Free,
    Blocked,
}

#[derive(Debug, Clone, Copy)]
struct NodeRecord {
    g: f32,
    parent: Option<(i32, i32)>,
    closed: bool,
}

impl Default for NodeRecord {
    fn default() -> Self {
        Self {
            g: f32::INFINITY,
            parent: None,
            closed: false,
        }
    }
}

/// Octile distance in nav cells
fn heuristic(a: (i32, i32), b: (i32, i32)) -> f32 {
    let dx = (a.0 - b.0).abs() as f32;
    let dy = (a.1 - b.1).abs() as f32;
    dx.max(dy) + (std::f32::consts::SQRT_2 - 1.0) * dx.min(dy)
}

const NEIGHBORS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Raw grid path from start to goal as nav-cell centers, start excluded
/// and the exact goal appended. Empty when no path exists or the
/// iteration budget runs out.
pub fn find_raw_path(
    grid: &WorldGrid,
    request: &PathRequest,
    config: &PathfindingConfig,
) -> Vec<Vec2> {
    let size = grid.size();
    if !request.start.is_finite() || !request.goal.is_finite() || !grid.in_bounds(request.goal) {
        return Vec::new();
    }
    if grid.is_blocked_for_movement(request.goal) {
        debug!("Path goal {:?} is blocked", request.goal);
        return Vec::new();
    }

    let mut records: Grid<NodeRecord> =
        Grid::covering(size.x, size.y, config.nav_cell_size);
    let mut footprints: Grid<Footprint> =
        Grid::covering(size.x, size.y, config.nav_cell_size);
    let start = records.clamped_cell_of(request.start);
    let goal = records.clamped_cell_of(request.goal);

    if start == goal {
        return vec![request.goal];
    }

    let mut passable = |cell: (i32, i32)| -> bool {
        if cell == goal {
            return true;
        }
        match footprints.get(cell.0, cell.1) {
            None => false,
            Some(Footprint::Free) => true,
            Some(Footprint::Blocked) => false,
            Some(Footprint::Unknown) => {
                let center = footprints.cell_center(cell.0, cell.1);
                let free = !grid.circle_blocked(center, request.radius);
                footprints.set(
                    cell.0,
                    cell.1,
                    if free {
                        Footprint::Free
                    } else {
                        Footprint::Blocked
                    },
                );
                free
            }
        }
    };

    let mut open_set = BinaryHeap::new();
    records.set(
        start.0,
        start.1,
        NodeRecord {
            g: 0.0,
            parent: None,
            closed: false,
        },
    );
    open_set.push(PathNode {
        cell: start,
        f_cost: OrderedFloat(heuristic(start, goal)),
    });

    let mut iterations = 0;
    while let Some(current) = open_set.pop() {
        iterations += 1;
        if iterations > config.max_iterations {
            debug!(
                "Path search exhausted its budget ({} iterations)",
                config.max_iterations
            );
            return Vec::new();
        }
        if current.cell == goal {
            return reconstruct_path(&records, goal, request.goal);
        }

        let Some(record) = records.get_mut(current.cell.0, current.cell.1) else {
            continue;
        };
        if record.closed {
            continue;
        }
        record.closed = true;
        let current_g = record.g;

        for (dx, dy) in NEIGHBORS {
            let next = (current.cell.0 + dx, current.cell.1 + dy);
            if !passable(next) {
                continue;
            }
            // No corner cutting
            if dx != 0
                && dy != 0
                && (!passable((current.cell.0 + dx, current.cell.1))
                    || !passable((current.cell.0, current.cell.1 + dy)))
            {
                continue;
            }

            let center = records.cell_center(next.0, next.1);
            let step = if dx != 0 && dy != 0 {
                std::f32::consts::SQRT_2
            } else {
                1.0
            };
            let terrain = if grid.is_in_bush(center) && !request.prefers_stealth {
                config.bush_cost
            } else {
                1.0
            };
            let heat = request.heat.map_or(0.0, |h| h.value_at(center));
            let tentative_g = current_g + step * terrain + heat * config.heat_cost;

            let Some(neighbor) = records.get_mut(next.0, next.1) else {
                continue;
            };
            if !neighbor.closed && tentative_g < neighbor.g {
                neighbor.g = tentative_g;
                neighbor.parent = Some(current.cell);
                open_set.push(PathNode {
                    cell: next,
                    f_cost: OrderedFloat(tentative_g + heuristic(next, goal)),
                });
            }
        }
    }

    Vec::new()
}

/// Walk parents back from the goal
fn reconstruct_path(records: &Grid<NodeRecord>, goal: (i32, i32), exact_goal: Vec2) -> Vec<Vec2> {
    let mut path = vec![exact_goal];
    let mut current = goal;
    while let Some(parent) = records.get(current.0, current.1).and_then(|r| r.parent) {
        if records.get(parent.0, parent.1).and_then(|r| r.parent).is_none() {
            // Parent is the start cell
            break;
        }
        path.push(records.cell_center(parent.0, parent.1));
        current = parent;
    }
    path.reverse();
    path
}
