//! Read-only views for renderers and tooling

use serde::Serialize;

use crate::agent::Agent;
use crate::core::types::{AgentId, Role, TeamId, Vec2};
use crate::decision::Mode;
use crate::simulation::projectile::ProjectileKind;

/// Everything a renderer needs to draw one agent
#[derive(Debug, Clone, Serialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub team: TeamId,
    pub role: Role,
    pub rank: u8,
    pub position: Vec2,
    pub facing: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub stress: f32,
    pub suppression: f32,
    pub morale: f32,
    pub ammo: u32,
    pub reserve: u32,
    pub action: &'static str,
    pub mode: Mode,
    pub downed: bool,
    pub pinned: bool,
    pub is_leader: bool,
}

impl From<&Agent> for AgentSnapshot {
    fn from(agent: &Agent) -> Self {
        let weapon = &agent.state.inventory.weapon;
        Self {
            id: agent.id,
            team: agent.team,
            role: agent.role,
            rank: agent.rank,
            position: agent.position,
            facing: agent.facing,
            hp: agent.state.hp,
            max_hp: agent.state.max_hp,
            stress: agent.state.stress,
            suppression: agent.state.suppression,
            morale: agent.state.morale,
            ammo: weapon.magazine,
            reserve: weapon.reserve,
            action: agent.action.tag(),
            mode: agent.mode,
            downed: agent.state.downed,
            pinned: agent.state.pinned,
            is_leader: agent.is_leader(),
        }
    }
}

/// Short-lived visual marker (muzzle flash, impact, blast)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlashEffect {
    pub position: Vec2,
    pub radius: f32,
    pub kind: FlashKind,
    pub expires_at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FlashKind {
    Impact,
    Blast,
    Smoke,
}

/// Position and kind of a projectile in flight
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProjectileSnapshot {
    pub kind: ProjectileKind,
    pub position: Vec2,
    pub heading: f32,
}

/// Running totals for a simulation
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct WorldStats {
    pub ticks: u64,
    pub shots: u64,
    pub hits: u64,
    pub downed: u64,
    pub deaths: u64,
    pub explosions: u64,
    pub covers_destroyed: u64,
}
