//! Autonomous combatants
//!
//! An `Agent` owns its resource state, personality and memory exclusively.
//! Other agents are referred to by `AgentId` only.

pub mod action;
pub mod combat;
pub mod executor;
pub mod movement;
pub mod state;
pub mod traits;

pub use action::{Action, FireMode, MoveMode, MovePurpose, ThrowKind};
pub use combat::{try_fire, FireOutcome};
pub use executor::execute;
pub use state::{
    DamageOutcome, Inventory, ResourceState, UtilityKind, Weapon, WeaponKind, MORALE_MAX,
    SOCIAL_MAX, STRESS_MAX, SUPPRESSION_MAX,
};
pub use traits::Traits;

use crate::core::config::{PerceptionConfig, SimConfig};
use crate::core::types::{AgentId, Role, TeamId, Vec2};
use crate::decision::Mode;
use crate::pathfinding::PathPlan;
use crate::perception::Memory;

#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub team: TeamId,
    pub role: Role,
    /// 1 for the squad leader, 2 for everyone else
    pub rank: u8,

    pub position: Vec2,
    /// Facing angle in radians
    pub facing: f32,
    pub radius: f32,
    pub velocity: Vec2,

    pub state: ResourceState,
    pub traits: Traits,
    pub memory: Memory,

    pub mode: Mode,
    pub action: Action,
    pub move_mode: MoveMode,
    pub path: PathPlan,

    // Throttling timestamps (clock seconds)
    pub next_perception_at: f64,
    pub last_perception_at: Option<f64>,
    pub next_decision_at: f64,
    pub last_reaction_at: f64,
    pub last_distress_at: f64,
    /// Next decision ignores the stay score
    pub force_reevaluate: bool,
}

impl Agent {
    pub fn new(
        id: AgentId,
        team: TeamId,
        role: Role,
        position: Vec2,
        traits: Traits,
        config: &SimConfig,
        world_size: Vec2,
    ) -> Self {
        Self {
            id,
            team,
            role,
            rank: 2,
            position,
            // Team 0 starts on the west edge facing east, team 1 the reverse
            facing: if team.0 == 0 {
                0.0
            } else {
                std::f32::consts::PI
            },
            radius: config.body.radius,
            velocity: Vec2::ZERO,
            state: ResourceState::new(role, &config.body),
            traits,
            memory: Memory::new(world_size, &config.memory),
            mode: Mode::Idle,
            action: Action::Idle,
            move_mode: MoveMode::Jog,
            path: PathPlan::new(),
            next_perception_at: 0.0,
            last_perception_at: None,
            next_decision_at: 0.0,
            last_reaction_at: f64::NEG_INFINITY,
            last_distress_at: f64::NEG_INFINITY,
            force_reevaluate: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.state.dead
    }

    /// Alive and not downed
    pub fn is_active(&self) -> bool {
        !self.state.dead && !self.state.downed
    }

    pub fn is_leader(&self) -> bool {
        self.rank == 1
    }

    pub fn vision_radius(&self, config: &PerceptionConfig) -> f32 {
        self.traits.vision_radius(config.base_vision_radius)
    }

    /// Request an immediate re-evaluation, throttled by `cooldown`.
    /// Returns false when the request was swallowed by the throttle.
    pub fn react(&mut self, now: f64, cooldown: f64) -> bool {
        if !self.is_active() || now - self.last_reaction_at < cooldown {
            return false;
        }
        self.last_reaction_at = now;
        self.force_reevaluate = true;
        self.next_decision_at = now;
        true
    }

    /// Per-tick bookkeeping that runs regardless of mode: reload, recovery,
    /// bleeding and memory expiry. Returns true when the agent bled out.
    pub fn upkeep(&mut self, now: f64, dt: f32, config: &SimConfig) -> bool {
        let died = self.state.bleed(dt, &config.combat);
        if self.is_active() {
            self.state.finish_reload(now);
            self.state
                .recover(dt, self.traits.neuroticism, &config.body);
            let drain = config.body.social_drain * dt * (0.5 + self.traits.extraversion);
            self.state.add_social(-drain);
        }
        self.memory.expire(now, &config.memory);
        self.memory.decay_heat(now, &config.memory);
        self.state.sanitize();
        died
    }
}
