//! Static map descriptions and the procedural fallback
//!
//! A `MapDescription` is the file format owned by the map editor: a coarse
//! character grid plus tile size. Rasterizing it produces the fine
//! `WorldGrid` and the team spawn points.

use std::collections::VecDeque;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::config::WorldConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{TeamId, Vec2};
use crate::map::tiles::TileKind;
use crate::map::world_grid::WorldGrid;
use crate::spatial::Grid;

/// Map markup as written by the editor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapDescription {
    /// Width and height in map cells
    pub width: usize,
    pub height: usize,
    /// World units per map cell
    pub tile_size: f32,
    /// One string per row, one markup character per cell
    pub rows: Vec<String>,
    /// Presentation-only canvas dimensions, accepted and ignored
    #[serde(default)]
    pub canvas_width: Option<f32>,
    #[serde(default)]
    pub canvas_height: Option<f32>,
}

/// Spawn positions per team
#[derive(Debug, Clone, Default)]
pub struct SpawnPoints {
    pub team_a: Vec<Vec2>,
    pub team_b: Vec<Vec2>,
}

impl SpawnPoints {
    /// Spawn points for `team`; maps only mark points for the two sides
    pub fn for_team(&self, team: TeamId) -> &[Vec2] {
        match team.0 {
            0 => &self.team_a,
            1 => &self.team_b,
            _ => &[],
        }
    }
}

/// A rasterized map ready for simulation
#[derive(Debug, Clone)]
pub struct LoadedMap {
    pub grid: WorldGrid,
    pub spawns: SpawnPoints,
}

impl MapDescription {
    /// Parse and validate a map from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let map: MapDescription = serde_json::from_str(json)?;
        map.validate()?;
        Ok(map)
    }

    /// Load a map file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SimError::InvalidMap("map has no cells".into()));
        }
        if !self.tile_size.is_finite() || self.tile_size <= 0.0 {
            return Err(SimError::InvalidMap(format!(
                "tile_size must be positive, got {}",
                self.tile_size
            )));
        }
        if self.rows.len() != self.height {
            return Err(SimError::InvalidMap(format!(
                "expected {} rows, found {}",
                self.height,
                self.rows.len()
            )));
        }
        for (y, row) in self.rows.iter().enumerate() {
            let len = row.chars().count();
            if len != self.width {
                return Err(SimError::InvalidMap(format!(
                    "row {} has {} cells, expected {}",
                    y, len, self.width
                )));
            }
            if let Some(c) = row.chars().find(|c| TileKind::from_markup(*c).is_none()) {
                return Err(SimError::InvalidMap(format!(
                    "row {} has unknown markup '{}'",
                    y, c
                )));
            }
        }
        Ok(())
    }

    fn markup(&self) -> Grid<char> {
        let mut grid = Grid::new(self.width, self.height, self.tile_size);
        for (y, row) in self.rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                grid.set(x as i32, y as i32, c);
            }
        }
        grid
    }

    /// Expand the coarse markup into the fine tile grid
    pub fn rasterize(&self, config: &WorldConfig) -> LoadedMap {
        let ratio = (self.tile_size / config.tile_size).round().max(1.0) as usize;
        let fine_size = self.tile_size / ratio as f32;
        let mut grid = WorldGrid::new(
            self.width * ratio,
            self.height * ratio,
            fine_size,
            config.los_step,
        );
        let markup = self.markup();
        let bush_ids = label_bushes(&markup);
        let mut spawns = SpawnPoints::default();

        for (x, y, &c) in markup.cells() {
            let kind = TileKind::from_markup(c).unwrap_or_default();
            let r = ratio as i32;
            let (fx0, fy0) = (x * r, y * r);
            let (fx1, fy1) = (fx0 + r - 1, fy0 + r - 1);
            let center = markup.cell_center(x, y);

            match kind {
                TileKind::Wall | TileKind::Bush => {
                    let bush = bush_ids.get(x, y).copied().unwrap_or(0);
                    for fy in fy0..=fy1 {
                        for fx in fx0..=fx1 {
                            grid.paint(fx, fy, kind);
                            grid.set_bush_id(fx, fy, bush);
                        }
                    }
                }
                TileKind::LowCover => {
                    grid.add_cover(kind, (fx0, fy0, fx1, fy1), config.low_cover_hp);
                }
                TileKind::HighCover => {
                    grid.add_cover(kind, (fx0, fy0, fx1, fy1), config.high_cover_hp);
                }
                TileKind::Open => match c {
                    '1' => spawns.team_a.push(center),
                    '2' => spawns.team_b.push(center),
                    _ => {}
                },
            }
        }

        if spawns.team_a.is_empty() {
            spawns.team_a = default_spawn_region(&markup, true);
        }
        if spawns.team_b.is_empty() {
            spawns.team_b = default_spawn_region(&markup, false);
        }

        LoadedMap { grid, spawns }
    }

    /// Random map with a walled border, wall segments, bush patches and
    /// cover clusters. Spawn columns at the west and east edges stay clear.
    pub fn procedural<R: Rng + ?Sized>(
        rng: &mut R,
        width: usize,
        height: usize,
        tile_size: f32,
    ) -> Self {
        let width = width.max(12);
        let height = height.max(8);
        let mut cells = vec![vec!['.'; width]; height];

        for x in 0..width {
            cells[0][x] = '#';
            cells[height - 1][x] = '#';
        }
        for row in cells.iter_mut() {
            row[0] = '#';
            row[width - 1] = '#';
        }

        let interior = |x: i32, y: i32| {
            x >= 4 && y >= 1 && (x as usize) < width - 4 && (y as usize) < height - 1
        };

        let area = width * height;
        for _ in 0..area / 60 {
            let len = rng.gen_range(3..=8);
            let horizontal = rng.gen_bool(0.5);
            let (mut x, mut y) = (
                rng.gen_range(0..width) as i32,
                rng.gen_range(0..height) as i32,
            );
            for _ in 0..len {
                if interior(x, y) {
                    cells[y as usize][x as usize] = '#';
                }
                if horizontal {
                    x += 1;
                } else {
                    y += 1;
                }
            }
        }

        for _ in 0..area / 120 {
            let cx = rng.gen_range(0..width) as i32;
            let cy = rng.gen_range(0..height) as i32;
            let radius = rng.gen_range(1..=3);
            for y in cy - radius..=cy + radius {
                for x in cx - radius..=cx + radius {
                    let inside = (x - cx).pow(2) + (y - cy).pow(2) <= radius * radius;
                    if inside && interior(x, y) && cells[y as usize][x as usize] == '.' {
                        cells[y as usize][x as usize] = '*';
                    }
                }
            }
        }

        for _ in 0..area / 80 {
            let mark = if rng.gen_bool(0.2) { 'C' } else { 'c' };
            let (x, y) = (
                rng.gen_range(0..width) as i32,
                rng.gen_range(0..height) as i32,
            );
            let len = rng.gen_range(1..=3);
            for i in 0..len {
                if interior(x + i, y) && cells[y as usize][(x + i) as usize] == '.' {
                    cells[y as usize][(x + i) as usize] = mark;
                }
            }
        }

        let mid = height / 2;
        for y in mid.saturating_sub(2)..=(mid + 2).min(height - 2) {
            cells[y][1] = '1';
            cells[y][width - 2] = '2';
        }

        Self {
            width,
            height,
            tile_size,
            rows: cells.into_iter().map(|row| row.into_iter().collect()).collect(),
            canvas_width: None,
            canvas_height: None,
        }
    }
}

/// Four-connected bush regions share an id starting at 1
fn label_bushes(markup: &Grid<char>) -> Grid<u16> {
    let mut labels: Grid<u16> = Grid::new(markup.width, markup.height, markup.cell_size);
    let mut next: u16 = 1;
    let mut queue = VecDeque::new();

    for (x, y, &c) in markup.cells() {
        if c != '*' || labels.get(x, y).copied().unwrap_or(0) != 0 {
            continue;
        }
        labels.set(x, y, next);
        queue.push_back((x, y));
        while let Some((cx, cy)) = queue.pop_front() {
            for (nx, ny) in [(cx + 1, cy), (cx - 1, cy), (cx, cy + 1), (cx, cy - 1)] {
                if markup.get(nx, ny) == Some(&'*') && labels.get(nx, ny) == Some(&0) {
                    labels.set(nx, ny, next);
                    queue.push_back((nx, ny));
                }
            }
        }
        next = next.saturating_add(1).max(1);
    }
    labels
}

/// Open cells in the first usable column from the west or east edge
fn default_spawn_region(markup: &Grid<char>, west: bool) -> Vec<Vec2> {
    let columns: Vec<i32> = if west {
        (0..markup.width as i32).collect()
    } else {
        (0..markup.width as i32).rev().collect()
    };
    for x in columns {
        let points: Vec<Vec2> = (0..markup.height as i32)
            .filter(|&y| matches!(markup.get(x, y), Some('.' | '1' | '2')))
            .map(|y| markup.cell_center(x, y))
            .collect();
        if !points.is_empty() {
            return points;
        }
    }
    Vec::new()
}

/// Load the map at `path`, falling back to a procedural map
///
/// The returned error, if any, is the startup diagnostic for the caller to
/// surface. A missing path is not an error.
pub fn load_or_generate<R: Rng + ?Sized>(
    path: Option<&Path>,
    config: &WorldConfig,
    rng: &mut R,
) -> (MapDescription, Option<SimError>) {
    let generate = |rng: &mut R| {
        MapDescription::procedural(
            rng,
            config.fallback_width as usize,
            config.fallback_height as usize,
            config.fallback_map_tile,
        )
    };

    let Some(path) = path else {
        return (generate(rng), None);
    };

    match MapDescription::load(path) {
        Ok(map) => {
            info!(
                "Loaded map {} ({}x{} cells)",
                path.display(),
                map.width,
                map.height
            );
            (map, None)
        }
        Err(e) => {
            warn!(
                "Map {} is unusable ({}), using a procedural map",
                path.display(),
                e
            );
            (generate(rng), Some(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small_map() -> MapDescription {
        MapDescription {
            width: 6,
            height: 4,
            tile_size: 8.0,
            rows: vec![
                "######".into(),
                "#1*c2#".into(),
                "#.**C#".into(),
                "######".into(),
            ],
            canvas_width: Some(800.0),
            canvas_height: None,
        }
    }

    #[test]
    fn test_rasterize_scales_to_fine_grid() {
        let loaded = small_map().rasterize(&WorldConfig::default());
        // 8 px map cells over 4 px fine tiles
        assert_eq!(loaded.grid.width(), 12);
        assert_eq!(loaded.grid.height(), 8);
        assert_eq!(loaded.grid.size(), Vec2::new(48.0, 32.0));
        assert_eq!(loaded.grid.tile_at(Vec2::new(2.0, 2.0)), TileKind::Wall);
    }

    #[test]
    fn test_cover_cells_become_covers() {
        let loaded = small_map().rasterize(&WorldConfig::default());
        assert_eq!(loaded.grid.covers().len(), 2);
        let high = loaded
            .grid
            .covers()
            .iter()
            .find(|c| c.kind == TileKind::HighCover)
            .expect("high cover");
        assert_eq!(high.hp, WorldConfig::default().high_cover_hp);
        assert!(loaded.grid.is_blocked_for_movement(Vec2::new(28.0, 12.0)));
    }

    #[test]
    fn test_connected_bushes_share_an_id() {
        let loaded = small_map().rasterize(&WorldConfig::default());
        let a = loaded.grid.bush_id_at(Vec2::new(20.0, 12.0));
        let b = loaded.grid.bush_id_at(Vec2::new(20.0, 20.0));
        let c = loaded.grid.bush_id_at(Vec2::new(28.0, 20.0));
        assert_ne!(a, 0);
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_spawn_markers() {
        let loaded = small_map().rasterize(&WorldConfig::default());
        assert_eq!(loaded.spawns.team_a, vec![Vec2::new(12.0, 12.0)]);
        assert_eq!(loaded.spawns.for_team(TeamId(1)), &[Vec2::new(36.0, 12.0)]);
        assert!(loaded.spawns.for_team(TeamId(2)).is_empty());
    }

    #[test]
    fn test_missing_spawns_default_to_edges() {
        let mut map = small_map();
        map.rows[1] = "#.*c.#".into();
        let loaded = map.rasterize(&WorldConfig::default());
        assert!(!loaded.spawns.team_a.is_empty());
        assert!(loaded.spawns.team_a.iter().all(|p| p.x < 16.0));
        assert!(loaded.spawns.team_b.iter().all(|p| p.x > 32.0));
    }

    #[test]
    fn test_validate_rejects_ragged_rows() {
        let mut map = small_map();
        map.rows[2] = "#..".into();
        assert!(matches!(map.validate(), Err(SimError::InvalidMap(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_markup() {
        let mut map = small_map();
        map.rows[2] = "#.?*C#".into();
        assert!(map.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            MapDescription::from_json("{\"width\": 3"),
            Err(SimError::MapParse(_))
        ));
    }

    #[test]
    fn test_procedural_map_is_valid() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let map = MapDescription::procedural(&mut rng, 40, 24, 20.0);
        assert!(map.validate().is_ok());
        let loaded = map.rasterize(&WorldConfig::default());
        assert_eq!(loaded.spawns.team_a.len(), 5);
        assert_eq!(loaded.spawns.team_b.len(), 5);
        for p in loaded.spawns.team_a.iter().chain(&loaded.spawns.team_b) {
            assert!(!loaded.grid.is_blocked_for_movement(*p));
        }
    }

    #[test]
    fn test_load_or_generate_falls_back_on_missing_file() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let config = WorldConfig::default();
        let (map, diagnostic) =
            load_or_generate(Some(Path::new("/nonexistent/map.json")), &config, &mut rng);
        assert!(matches!(diagnostic, Some(SimError::IoError(_))));
        assert_eq!(map.width, config.fallback_width as usize);

        let (_, none) = load_or_generate(None, &config, &mut rng);
        assert!(none.is_none());
    }

    #[test]
    fn test_shipped_map_loads() {
        let map = MapDescription::from_json(include_str!("../../data/maps/outpost.json"))
            .expect("shipped map should be valid");
        let loaded = map.rasterize(&WorldConfig::default());
        assert!(!loaded.spawns.team_a.is_empty());
        assert!(!loaded.spawns.team_b.is_empty());
    }
}
