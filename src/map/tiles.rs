//! Tile kinds and static obstacle pieces

use serde::{Deserialize, Serialize};

use crate::core::types::{CoverId, Vec2};

/// What occupies one fine grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Open,
    /// Structural, indestructible
    Wall,
    /// Soft occluder: blocks sight, not movement
    Bush,
    /// Blocks movement and bullets, not sight
    LowCover,
    /// Blocks movement, bullets and (when respected) sight
    HighCover,
}

impl TileKind {
    pub fn blocks_movement(&self) -> bool {
        matches!(self, TileKind::Wall | TileKind::LowCover | TileKind::HighCover)
    }

    pub fn is_cover(&self) -> bool {
        matches!(self, TileKind::LowCover | TileKind::HighCover)
    }

    /// Map markup character
    pub fn from_markup(c: char) -> Option<TileKind> {
        match c {
            '.' | '1' | '2' => Some(TileKind::Open),
            '#' => Some(TileKind::Wall),
            '*' => Some(TileKind::Bush),
            'c' => Some(TileKind::LowCover),
            'C' => Some(TileKind::HighCover),
            _ => None,
        }
    }
}

/// A destructible cover piece occupying a rectangle of fine cells
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cover {
    pub id: CoverId,
    pub kind: TileKind,
    /// Inclusive fine-cell rectangle (x0, y0, x1, y1)
    pub cells: (i32, i32, i32, i32),
    pub center: Vec2,
    /// Radius of the bounding circle, for the spatial index
    pub radius: f32,
    pub hp: f32,
    pub max_hp: f32,
}

/// A vision-blocking smoke volume
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SmokeCloud {
    pub center: Vec2,
    pub radius: f32,
    pub expires_at: f64,
}
