//! Tile occupancy, line of sight and collision queries
//!
//! Two parallel grids: `tiles` holds the live state including destructible
//! cover, `natural` holds only walls and bushes. Sight through structural
//! walls is judged on the natural grid so cover destruction never changes
//! what counts as a wall.

use serde::{Deserialize, Serialize};

use crate::core::types::{point_segment_distance, CoverId, Vec2};
use crate::map::tiles::{Cover, SmokeCloud, TileKind};
use crate::spatial::Grid;

/// Emitted when a cover piece runs out of hit points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverDestroyed {
    pub id: CoverId,
    pub position: Vec2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldGrid {
    tiles: Grid<TileKind>,
    natural: Grid<TileKind>,
    /// Connected-bush identifier per cell, 0 = no bush
    bush_ids: Grid<u16>,
    /// Cover id + 1 per cell, 0 = no cover
    cover_cells: Grid<u32>,
    covers: Vec<Cover>,
    smokes: Vec<SmokeCloud>,
    next_cover_id: u32,
    los_step: f32,
}

impl WorldGrid {
    /// An all-open grid
    pub fn new(width: usize, height: usize, tile_size: f32, los_step: f32) -> Self {
        Self {
            tiles: Grid::new(width, height, tile_size),
            natural: Grid::new(width, height, tile_size),
            bush_ids: Grid::new(width, height, tile_size),
            cover_cells: Grid::new(width, height, tile_size),
            covers: Vec::new(),
            smokes: Vec::new(),
            next_cover_id: 0,
            los_step: los_step.max(0.5),
        }
    }

    pub fn width(&self) -> usize {
        self.tiles.width
    }

    pub fn height(&self) -> usize {
        self.tiles.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tiles.cell_size
    }

    /// World-space size in world units
    pub fn size(&self) -> Vec2 {
        self.tiles.world_size()
    }

    pub fn in_bounds(&self, p: Vec2) -> bool {
        let size = self.size();
        p.is_finite() && p.x >= 0.0 && p.y >= 0.0 && p.x < size.x && p.y < size.y
    }

    pub fn cell_of(&self, p: Vec2) -> (i32, i32) {
        self.tiles.cell_of(p)
    }

    pub fn cell_center(&self, x: i32, y: i32) -> Vec2 {
        self.tiles.cell_center(x, y)
    }

    /// Live tile kind at a world position; out of bounds reads as wall
    pub fn tile_at(&self, p: Vec2) -> TileKind {
        self.tiles.sample(p).copied().unwrap_or(TileKind::Wall)
    }

    /// Paint a structural tile (wall, bush or open) into both grids
    pub fn paint(&mut self, x: i32, y: i32, kind: TileKind) {
        debug_assert!(!kind.is_cover(), "cover is placed with add_cover");
        self.tiles.set(x, y, kind);
        self.natural.set(x, y, kind);
    }

    pub fn set_bush_id(&mut self, x: i32, y: i32, id: u16) {
        self.bush_ids.set(x, y, id);
    }

    /// Register a cover rectangle of fine cells; returns its id
    pub fn add_cover(&mut self, kind: TileKind, cells: (i32, i32, i32, i32), hp: f32) -> CoverId {
        let id = CoverId(self.next_cover_id);
        self.next_cover_id += 1;
        let (x0, y0, x1, y1) = cells;
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.tiles.set(x, y, kind);
                self.cover_cells.set(x, y, id.0 + 1);
            }
        }
        let min = self.tiles.cell_center(x0, y0) - Vec2::splat(self.tile_size() * 0.5);
        let max = self.tiles.cell_center(x1, y1) + Vec2::splat(self.tile_size() * 0.5);
        let center = (min + max) * 0.5;
        self.covers.push(Cover {
            id,
            kind,
            cells,
            center,
            radius: center.distance(max),
            hp,
            max_hp: hp,
        });
        id
    }

    pub fn covers(&self) -> &[Cover] {
        &self.covers
    }

    pub fn cover(&self, id: CoverId) -> Option<&Cover> {
        self.covers.iter().find(|c| c.id == id)
    }

    pub fn cover_at(&self, p: Vec2) -> Option<CoverId> {
        match self.cover_cells.sample(p) {
            Some(&v) if v > 0 => Some(CoverId(v - 1)),
            _ => None,
        }
    }

    /// Apply damage to a cover piece, destroying it at zero hit points
    pub fn damage_cover(&mut self, id: CoverId, amount: f32) -> Option<CoverDestroyed> {
        let cover = self.covers.iter_mut().find(|c| c.id == id)?;
        if amount.is_finite() && amount > 0.0 {
            cover.hp -= amount;
        }
        if cover.hp > 0.0 {
            return None;
        }

        let (x0, y0, x1, y1) = cover.cells;
        let position = cover.center;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let natural = self.natural.get(x, y).copied().unwrap_or_default();
                self.tiles.set(x, y, natural);
                self.cover_cells.set(x, y, 0);
            }
        }
        self.covers.retain(|c| c.id != id);
        Some(CoverDestroyed { id, position })
    }

    pub fn bush_id_at(&self, p: Vec2) -> u16 {
        self.bush_ids.sample(p).copied().unwrap_or(0)
    }

    pub fn is_in_bush(&self, p: Vec2) -> bool {
        self.natural.sample(p) == Some(&TileKind::Bush)
    }

    /// Hard wall or cover (out of bounds counts as blocked)
    pub fn is_blocked_for_movement(&self, p: Vec2) -> bool {
        self.tile_at(p).blocks_movement()
    }

    /// Hard wall or bush, unless `target` lies inside the same bush
    pub fn is_blocked_for_vision(&self, p: Vec2, target: Vec2) -> bool {
        match self.natural.sample(p) {
            None | Some(TileKind::Wall) => true,
            Some(TileKind::Bush) => {
                let id = self.bush_id_at(p);
                id == 0 || id != self.bush_id_at(target)
            }
            _ => false,
        }
    }

    /// Does any footprint sample of a circle hit a movement blocker?
    pub fn circle_blocked(&self, center: Vec2, radius: f32) -> bool {
        if self.is_blocked_for_movement(center) {
            return true;
        }
        const DIRS: [(f32, f32); 8] = [
            (1.0, 0.0),
            (-1.0, 0.0),
            (0.0, 1.0),
            (0.0, -1.0),
            (0.707, 0.707),
            (-0.707, 0.707),
            (0.707, -0.707),
            (-0.707, -0.707),
        ];
        DIRS.iter()
            .any(|&(dx, dy)| self.is_blocked_for_movement(center + Vec2::new(dx, dy) * radius))
    }

    /// Is the segment crossed by an active smoke volume?
    pub fn smoke_blocks(&self, a: Vec2, b: Vec2) -> bool {
        self.smokes
            .iter()
            .any(|s| point_segment_distance(s.center, a, b) < s.radius)
    }

    pub fn add_smoke(&mut self, cloud: SmokeCloud) {
        self.smokes.push(cloud);
    }

    pub fn smokes(&self) -> &[SmokeCloud] {
        &self.smokes
    }

    /// Drop expired smoke volumes
    pub fn age_smoke(&mut self, now: f64) {
        self.smokes.retain(|s| s.expires_at > now);
    }

    /// Sampled line of sight between two points
    ///
    /// Samples are taken in a canonical endpoint order, so structural sight is
    /// symmetric. Bush cells belonging to the bush either endpoint stands in
    /// are see-through; high cover blocks only when `respect_cover` is set.
    pub fn has_line_of_sight(
        &self,
        a: Vec2,
        b: Vec2,
        max_distance: f32,
        respect_cover: bool,
    ) -> bool {
        let dist = a.distance(b);
        if !dist.is_finite() || dist > max_distance {
            return false;
        }
        if self.smoke_blocks(a, b) {
            return false;
        }

        let origin_bush = self.bush_id_at(a);
        let target_bush = self.bush_id_at(b);
        let (p, q) = if a.x < b.x || (a.x == b.x && a.y <= b.y) {
            (a, b)
        } else {
            (b, a)
        };

        let steps = (dist / self.los_step).ceil() as usize;
        for i in 1..steps {
            let t = i as f32 / steps as f32;
            let sample = p + (q - p) * t;
            if self.sample_blocks_sight(sample, origin_bush, target_bush, respect_cover) {
                return false;
            }
        }
        true
    }

    fn sample_blocks_sight(
        &self,
        sample: Vec2,
        origin_bush: u16,
        target_bush: u16,
        respect_cover: bool,
    ) -> bool {
        let grid = if respect_cover { &self.tiles } else { &self.natural };
        match grid.sample(sample) {
            None | Some(TileKind::Wall) => true,
            Some(TileKind::HighCover) => true,
            Some(TileKind::Bush) => {
                let id = self.bush_id_at(sample);
                id == 0 || (id != origin_bush && id != target_bush)
            }
            _ => false,
        }
    }

    /// Distance along a ray until a structural wall, capped at `max_distance`
    pub fn ray_distance(&self, origin: Vec2, angle: f32, max_distance: f32) -> f32 {
        let dir = Vec2::from_angle(angle);
        let step = self.tile_size() * 0.5;
        let mut travelled = 0.0;
        while travelled < max_distance {
            let p = origin + dir * travelled;
            match self.natural.sample(p) {
                None | Some(TileKind::Wall) => return travelled,
                _ => {}
            }
            travelled += step;
        }
        max_distance
    }

    /// Does a straight segment stay clear of movement blockers?
    pub fn segment_clear(&self, a: Vec2, b: Vec2) -> bool {
        let dist = a.distance(b);
        let steps = (dist / (self.tile_size() * 0.5)).ceil().max(1.0) as usize;
        (0..=steps).all(|i| {
            let t = i as f32 / steps as f32;
            !self.is_blocked_for_movement(a + (b - a) * t)
        })
    }
}
