//! Uniform bucket grid for proximity queries
//!
//! Rebuilt from scratch every tick. Entries carry only a handle, so nothing
//! stale survives between ticks.

use ahash::AHashSet;

use crate::core::types::{AgentId, CoverId, Vec2};
use crate::spatial::grid::Grid;

/// What an index entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpatialHandle {
    Agent(AgentId),
    Cover(CoverId),
}

/// A bounding circle registered in the index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub handle: SpatialHandle,
    pub position: Vec2,
    pub radius: f32,
}

/// Uniform grid over the world bounds
pub struct SpatialIndex {
    buckets: Grid<Vec<SpatialEntry>>,
}

impl SpatialIndex {
    pub fn new(world_size: Vec2, cell_size: f32) -> Self {
        Self {
            buckets: Grid::covering(world_size.x, world_size.y, cell_size),
        }
    }

    pub fn clear(&mut self) {
        for bucket in self.buckets.iter_mut() {
            bucket.clear();
        }
    }

    /// Cell range overlapped by a circle, clamped to the grid
    fn footprint(&self, center: Vec2, radius: f32) -> (i32, i32, i32, i32) {
        let r = radius.max(0.0);
        let (x0, y0) = self.buckets.clamped_cell_of(center - Vec2::splat(r));
        let (x1, y1) = self.buckets.clamped_cell_of(center + Vec2::splat(r));
        (x0, y0, x1, y1)
    }

    /// Bucket an entry into every cell its bounding circle touches
    pub fn insert(&mut self, entry: SpatialEntry) {
        if !entry.position.is_finite() {
            return;
        }
        let (x0, y0, x1, y1) = self.footprint(entry.position, entry.radius);
        for y in y0..=y1 {
            for x in x0..=x1 {
                if let Some(bucket) = self.buckets.get_mut(x, y) {
                    bucket.push(entry);
                }
            }
        }
    }

    /// Every entry whose buckets intersect the query footprint
    ///
    /// Superset of the true result: callers refine with exact distance.
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<SpatialEntry> {
        let mut seen = AHashSet::new();
        let mut out = Vec::new();
        if !center.is_finite() {
            return out;
        }
        let (x0, y0, x1, y1) = self.footprint(center, radius);
        for y in y0..=y1 {
            for x in x0..=x1 {
                if let Some(bucket) = self.buckets.get(x, y) {
                    for entry in bucket {
                        if seen.insert(entry.handle) {
                            out.push(*entry);
                        }
                    }
                }
            }
        }
        out
    }

    /// Agents near a point, refined by exact circle overlap
    pub fn agents_within(&self, center: Vec2, radius: f32) -> Vec<AgentId> {
        self.query_radius(center, radius)
            .into_iter()
            .filter_map(|e| match e.handle {
                SpatialHandle::Agent(id) if e.position.distance(center) <= radius + e.radius => {
                    Some(id)
                }
                _ => None,
            })
            .collect()
    }

    /// Total bucket memberships (an entry spanning four cells counts four times)
    pub fn membership_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}
