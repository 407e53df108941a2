//! Per-agent view of the world during a tick
//!
//! An agent being updated is borrowed mutably; everyone else is visible
//! read-only through a `Roster`. Anything the agent wants to do to the rest
//! of the world goes into its `Outbox` and is applied by the orchestrator
//! right after that agent's update.

use ahash::AHashMap;

use crate::agent::Agent;
use crate::core::config::SimConfig;
use crate::core::types::{AgentId, LootId, TeamId, Vec2};
use crate::map::WorldGrid;
use crate::perception::DistressKind;
use crate::simulation::events::SimEvent;
use crate::simulation::loot::LootCache;
use crate::simulation::projectile::Projectile;
use crate::simulation::squad::{SquadBoard, SquadState};
use crate::spatial::SpatialIndex;

/// Read-only access to every agent except the one being updated
#[derive(Clone, Copy)]
pub struct Roster<'a> {
    before: &'a [Agent],
    after: &'a [Agent],
    lookup: &'a AHashMap<AgentId, usize>,
    me: usize,
}

impl<'a> Roster<'a> {
    /// `before` and `after` are the slices on either side of index `me`
    pub fn new(
        before: &'a [Agent],
        after: &'a [Agent],
        lookup: &'a AHashMap<AgentId, usize>,
        me: usize,
    ) -> Self {
        Self {
            before,
            after,
            lookup,
            me,
        }
    }

    pub fn get(&self, id: AgentId) -> Option<&'a Agent> {
        let &index = self.lookup.get(&id)?;
        match index.cmp(&self.me) {
            std::cmp::Ordering::Less => self.before.get(index),
            std::cmp::Ordering::Greater => self.after.get(index - self.me - 1),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Agent> {
        self.before.iter().chain(self.after.iter())
    }

    /// Living, non-downed teammates
    pub fn teammates(&self, team: TeamId) -> impl Iterator<Item = &'a Agent> {
        self.iter()
            .filter(move |a| a.team == team && a.is_active())
    }
}

/// Everything an agent may read while it updates
pub struct TickContext<'a> {
    pub config: &'a SimConfig,
    pub grid: &'a WorldGrid,
    pub index: &'a SpatialIndex,
    pub roster: Roster<'a>,
    pub loot: &'a [LootCache],
    pub squads: &'a SquadBoard,
    pub now: f64,
    pub dt: f32,
}

impl<'a> TickContext<'a> {
    pub fn squad(&self, team: TeamId) -> Option<&'a SquadState> {
        self.squads.get(team)
    }

    /// Is `team` without orders after losing its leader?
    pub fn in_chaos(&self, team: TeamId) -> bool {
        self.squad(team).is_some_and(|s| s.in_chaos(self.now))
    }

    pub fn leader_of(&self, team: TeamId) -> Option<AgentId> {
        self.squad(team).and_then(|s| s.leader)
    }
}

/// A request from one agent to change shared state
#[derive(Debug, Clone)]
pub enum Effect {
    Spawn(Projectile),
    Event(SimEvent),
    /// Offer my heat map to teammates in range
    ShareHeat,
    Heal { target: AgentId },
    Resupply { target: AgentId, rounds: u32 },
    TakeLoot { cache: LootId },
    /// `observer` revises its trust in the acting agent
    Trust { observer: AgentId, delta: f32 },
    Distress { kind: DistressKind, position: Vec2 },
    Mutiny { target: AgentId },
    Socialize { with: AgentId },
}

#[derive(Debug, Default)]
pub struct Outbox {
    effects: Vec<Effect>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, Effect> {
        self.effects.drain(..)
    }
}
