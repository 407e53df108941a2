//! Core type definitions used throughout the codebase

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

pub use glam::Vec2;

/// Unique identifier for agents
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[display(fmt = "agent#{}", _0)]
pub struct AgentId(pub u32);

/// Team (squad) identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[display(fmt = "team#{}", _0)]
pub struct TeamId(pub u8);

/// Identifier of a destructible cover piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[display(fmt = "cover#{}", _0)]
pub struct CoverId(pub u32);

/// Identifier of a loot cache dropped on the ground
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[display(fmt = "loot#{}", _0)]
pub struct LootId(pub u32);

/// Combat role. Shapes loadout, speed and fire discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Rifleman,
    Gunner,
    Medic,
    Scout,
    Grenadier,
}

impl Role {
    /// Movement speed multiplier
    pub fn speed_modifier(&self) -> f32 {
        match self {
            Role::Rifleman => 1.0,
            Role::Gunner => 0.85,
            Role::Medic => 1.05,
            Role::Scout => 1.15,
            Role::Grenadier => 0.95,
        }
    }

    /// Does this role hold fire while concealed?
    pub fn has_trigger_discipline(&self) -> bool {
        !matches!(self, Role::Gunner)
    }

    /// Prefers routes through concealment
    pub fn prefers_stealth(&self) -> bool {
        matches!(self, Role::Scout)
    }

    /// Rotation used when spawning squads
    pub fn squad_rotation(index: usize) -> Role {
        const ROTATION: [Role; 6] = [
            Role::Rifleman,
            Role::Gunner,
            Role::Rifleman,
            Role::Medic,
            Role::Scout,
            Role::Grenadier,
        ];
        ROTATION[index % ROTATION.len()]
    }
}

/// Angle of a direction vector in radians
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Wrap an angle into (-PI, PI]
#[inline]
pub fn wrap_angle(a: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if !a.is_finite() {
        return 0.0;
    }
    let mut r = a % TAU;
    if r > PI {
        r -= TAU;
    } else if r <= -PI {
        r += TAU;
    }
    r
}

/// Absolute angular difference between two headings
#[inline]
pub fn angle_between(a: f32, b: f32) -> f32 {
    wrap_angle(a - b).abs()
}

/// Replace a non-finite value with a fallback, then clamp.
#[inline]
pub fn sanitize(value: f32, fallback: f32, min: f32, max: f32) -> f32 {
    let v = if value.is_finite() { value } else { fallback };
    let v = if v.is_finite() { v } else { min };
    v.clamp(min, max)
}

/// Distance from point `p` to segment `a`-`b`
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
