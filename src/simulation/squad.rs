//! Squad leadership, command chaos and elections

use serde::Serialize;

use crate::agent::{Action, Agent};
use crate::core::config::SquadConfig;
use crate::core::types::{AgentId, TeamId, Vec2};
use crate::decision::Mode;

/// What followers know about their squad's command state
#[derive(Debug, Clone, Serialize)]
pub struct SquadState {
    pub team: TeamId,
    pub leader: Option<AgentId>,
    /// Leader's mode, action and position as of the start of the tick
    pub leader_mode: Option<Mode>,
    #[serde(skip)]
    pub leader_action: Option<Action>,
    pub leader_position: Option<Vec2>,
    /// End of the command chaos window, if one is running
    pub chaos_until: Option<f64>,
}

impl SquadState {
    pub fn new(team: TeamId) -> Self {
        Self {
            team,
            leader: None,
            leader_mode: None,
            leader_action: None,
            leader_position: None,
            chaos_until: None,
        }
    }

    pub fn in_chaos(&self, now: f64) -> bool {
        self.chaos_until.is_some_and(|until| now < until)
    }

    /// Record the leader's loss and open a chaos window
    pub fn leader_lost(&mut self, now: f64, config: &SquadConfig) {
        self.leader = None;
        self.leader_mode = None;
        self.leader_action = None;
        self.leader_position = None;
        self.chaos_until = Some(now + config.chaos_duration);
    }

    /// Refresh the leader snapshot followers reason about
    pub fn observe_leader(&mut self, agents: &[Agent]) {
        let leader = self
            .leader
            .and_then(|id| agents.iter().find(|a| a.id == id));
        self.leader_mode = leader.map(|a| a.mode);
        self.leader_action = leader.map(|a| a.action);
        self.leader_position = leader.map(|a| a.position);
    }
}

/// One squad per team, opened when the team's first agent joins
#[derive(Debug, Clone, Default, Serialize)]
pub struct SquadBoard {
    squads: Vec<SquadState>,
}

impl SquadBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, team: TeamId) -> Option<&SquadState> {
        self.squads.iter().find(|s| s.team == team)
    }

    pub fn get_mut(&mut self, team: TeamId) -> Option<&mut SquadState> {
        self.squads.iter_mut().find(|s| s.team == team)
    }

    /// Squad for `team`, opening a leaderless one if the team is new
    pub fn ensure(&mut self, team: TeamId) -> &mut SquadState {
        let i = match self.squads.iter().position(|s| s.team == team) {
            Some(i) => i,
            None => {
                self.squads.push(SquadState::new(team));
                self.squads.len() - 1
            }
        };
        &mut self.squads[i]
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SquadState> {
        self.squads.iter_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SquadState> {
        self.squads.iter()
    }
}

/// Blend of leadership aptitude and the average trust teammates place in
/// the candidate
pub fn election_score(candidate: &Agent, agents: &[Agent], config: &SquadConfig) -> f32 {
    let peers: Vec<f32> = agents
        .iter()
        .filter(|a| a.team == candidate.team && a.id != candidate.id && !a.state.dead)
        .map(|a| a.memory.trust_of(candidate.id))
        .collect();
    let trust = if peers.is_empty() {
        0.5
    } else {
        peers.iter().sum::<f32>() / peers.len() as f32
    };
    config.election_aptitude_weight * candidate.traits.leadership
        + config.election_trust_weight * trust
}

/// Best living, non-downed candidate on a team
pub fn elect(agents: &[Agent], team: TeamId, config: &SquadConfig) -> Option<AgentId> {
    agents
        .iter()
        .filter(|a| a.team == team && a.is_active())
        .map(|a| (a.id, election_score(a, agents, config)))
        .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(id, _)| id)
}

/// Does a challenger unseat the leader? The challenger needs the higher
/// election standing among the squad.
pub fn mutiny_succeeds(
    challenger: &Agent,
    leader: &Agent,
    agents: &[Agent],
    config: &SquadConfig,
) -> bool {
    election_score(challenger, agents, config) > election_score(leader, agents, config)
}
