//! Concrete actions chosen by the decision engine

use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, LootId, Vec2};

/// Gait; sets base speed and stamina cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MoveMode {
    Sprint,
    #[default]
    Jog,
    Sneak,
    Crawl,
}

/// Aimed shot or area denial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FireMode {
    Attack,
    Suppress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThrowKind {
    Grenade,
    Smoke,
}

/// Why an agent is walking somewhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovePurpose {
    Patrol,
    Regroup,
    FollowOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Action {
    /// Stand and scan
    #[default]
    Idle,
    Move {
        target: Vec2,
        purpose: MovePurpose,
    },
    Attack {
        target: Option<AgentId>,
        position: Vec2,
        move_target: Option<Vec2>,
    },
    Suppress {
        target: Vec2,
    },
    Throw {
        kind: ThrowKind,
        target: Vec2,
    },
    Heal {
        target: AgentId,
    },
    Resupply {
        target: AgentId,
    },
    Retreat {
        target: Vec2,
    },
    Loot {
        cache: LootId,
        target: Vec2,
    },
    Mutiny {
        target: AgentId,
    },
    Socialize {
        target: AgentId,
    },
}

impl Action {
    /// Short label for snapshots and logs
    pub fn tag(&self) -> &'static str {
        match self {
            Action::Idle => "idle-scan",
            Action::Move { purpose, .. } => match purpose {
                MovePurpose::Patrol => "patrol",
                MovePurpose::Regroup => "regroup",
                MovePurpose::FollowOrder => "follow-order",
            },
            Action::Attack { .. } => "attack",
            Action::Suppress { .. } => "suppress",
            Action::Throw { .. } => "throw",
            Action::Heal { .. } => "heal",
            Action::Resupply { .. } => "resupply",
            Action::Retreat { .. } => "retreat",
            Action::Loot { .. } => "loot",
            Action::Mutiny { .. } => "mutiny",
            Action::Socialize { .. } => "socialize",
        }
    }

    /// Gait this action is executed at
    pub fn move_mode(&self, prefers_stealth: bool) -> MoveMode {
        match self {
            Action::Retreat { .. } => MoveMode::Sprint,
            Action::Suppress { .. } | Action::Throw { .. } => MoveMode::Crawl,
            Action::Idle | Action::Move { .. } if prefers_stealth => MoveMode::Sneak,
            _ => MoveMode::Jog,
        }
    }

    /// Advancing on a target, the cue teammates answer with covering fire
    pub fn is_advancing(&self) -> bool {
        matches!(
            self,
            Action::Attack {
                move_target: Some(_),
                ..
            }
        )
    }
}
