//! Discrete events for audio, VFX and UI collaborators

use serde::Serialize;

use crate::agent::ThrowKind;
use crate::core::types::{AgentId, CoverId, TeamId, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SoundKind {
    Gunshot,
    Explosion,
    Impact,
    Shout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimEvent {
    Sound {
        origin: Vec2,
        radius: f32,
        kind: SoundKind,
        source: Option<AgentId>,
    },
    Downed {
        id: AgentId,
        position: Vec2,
    },
    Death {
        id: AgentId,
        team: TeamId,
        position: Vec2,
        was_leader: bool,
    },
    Explosion {
        position: Vec2,
        radius: f32,
        kind: ThrowKind,
    },
    CoverDestroyed {
        id: CoverId,
        position: Vec2,
    },
    FirstContact {
        observer: AgentId,
        target: AgentId,
    },
    LeaderElected {
        team: TeamId,
        leader: AgentId,
    },
    Mutiny {
        team: TeamId,
        challenger: AgentId,
        leader: AgentId,
        succeeded: bool,
    },
}

/// Pending events plus the sounds agents have yet to hear
#[derive(Debug, Default)]
pub struct EventBus {
    pending: Vec<SimEvent>,
    unheard: Vec<SimEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: SimEvent) {
        if matches!(event, SimEvent::Sound { .. }) {
            self.unheard.push(event.clone());
        }
        self.pending.push(event);
    }

    /// Sounds emitted since the last call, for delivery to listeners
    pub fn take_unheard(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.unheard)
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[SimEvent] {
        &self.pending
    }
}
