//! Behavioral modes and the transition table

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::decision::scoring::{calm_score, danger_score, scarcity_score, social_score, threat_score};
use crate::simulation::context::TickContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Idle,
    Combat,
    Survival,
    Scavenge,
    Social,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Combat => "combat",
            Mode::Survival => "survival",
            Mode::Scavenge => "scavenge",
            Mode::Social => "social",
        }
    }
}

/// Pure desirability of entering a mode, roughly in [0, 1]
pub type ScoreFn = fn(&Agent, &TickContext) -> f32;

const FROM_IDLE: &[(Mode, ScoreFn)] = &[
    (Mode::Combat, threat_score),
    (Mode::Survival, danger_score),
    (Mode::Scavenge, scarcity_score),
    (Mode::Social, social_score),
];

const FROM_COMBAT: &[(Mode, ScoreFn)] = &[
    (Mode::Idle, calm_score),
    (Mode::Survival, danger_score),
    (Mode::Scavenge, scarcity_score),
    (Mode::Social, social_score),
];

const FROM_SURVIVAL: &[(Mode, ScoreFn)] = &[
    (Mode::Idle, calm_score),
    (Mode::Combat, threat_score),
    (Mode::Scavenge, scarcity_score),
];

const FROM_SCAVENGE: &[(Mode, ScoreFn)] = &[
    (Mode::Idle, calm_score),
    (Mode::Combat, threat_score),
    (Mode::Survival, danger_score),
];

const FROM_SOCIAL: &[(Mode, ScoreFn)] = &[
    (Mode::Idle, calm_score),
    (Mode::Combat, threat_score),
    (Mode::Survival, danger_score),
];

/// Outgoing edges of a mode
pub fn transitions(mode: Mode) -> &'static [(Mode, ScoreFn)] {
    match mode {
        Mode::Idle => FROM_IDLE,
        Mode::Combat => FROM_COMBAT,
        Mode::Survival => FROM_SURVIVAL,
        Mode::Scavenge => FROM_SCAVENGE,
        Mode::Social => FROM_SOCIAL,
    }
}
