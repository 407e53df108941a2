//! Mode scoring functions
//!
//! Each function reads the agent and its tick context and returns a
//! desirability in [0, 1]. None of them mutate anything.

use crate::agent::{Agent, UtilityKind};
use crate::core::config::DecisionConfig;
use crate::simulation::context::TickContext;

/// Pressure to fight: known hostiles, tempered by courage and ammo
pub fn threat_score(agent: &Agent, ctx: &TickContext) -> f32 {
    let known = agent.memory.hostiles.len() as f32;
    if known == 0.0 {
        let heat = agent.memory.heat.value_at(agent.position) / ctx.config.memory.heat_max;
        return (0.4 * heat).clamp(0.0, 1.0);
    }
    if agent.state.inventory.weapon.total_ammo() == 0 {
        return 0.0;
    }
    let spotted = agent.memory.spotted().count() as f32;
    let courage = agent.state.morale / 100.0 - 0.5 * agent.state.stress / 100.0;
    (0.45 + 0.1 * spotted.min(3.0) + 0.05 * known.min(3.0) + 0.2 * courage).clamp(0.0, 1.0)
}

/// Pressure to break contact: wounds, stress, suppression, low morale
pub fn danger_score(agent: &Agent, _ctx: &TickContext) -> f32 {
    let s = &agent.state;
    let mut score = 0.4 * (1.0 - s.hp_fraction())
        + 0.3 * s.stress / 100.0
        + 0.25 * s.suppression / 100.0
        + 0.15 * (1.0 - s.morale / 100.0)
        + 0.1 * agent.traits.neuroticism;
    if agent.memory.in_dread_zone(agent.position) {
        score += 0.1;
    }
    if agent.memory.hostiles.is_empty() && s.suppression < 1.0 {
        score *= 0.5;
    }
    score.clamp(0.0, 1.0)
}

/// Nothing threatening is known and the area has cooled down
pub fn calm_score(agent: &Agent, ctx: &TickContext) -> f32 {
    let composure = 1.0 - agent.state.stress / 100.0;
    if !agent.memory.hostiles.is_empty() {
        return (0.05 * composure).clamp(0.0, 1.0);
    }
    let heat = agent.memory.heat.value_at(agent.position) / ctx.config.memory.heat_max;
    (0.6 + 0.2 * composure - 0.4 * heat).clamp(0.0, 1.0)
}

/// Running low on ammunition
pub fn scarcity_score(agent: &Agent, ctx: &TickContext) -> f32 {
    let weapon = &agent.state.inventory.weapon;
    let fraction = weapon.ammo_fraction();
    if fraction >= 0.3 {
        return 0.0;
    }
    let mut score = 0.5 + (0.3 - fraction) * 1.5;
    let range = agent.vision_radius(&ctx.config.perception);
    if ctx
        .loot
        .iter()
        .any(|c| c.ammo > 0 && c.position.distance(agent.position) <= range)
    {
        score += 0.1;
    }
    if agent.memory.spotted().next().is_some() && weapon.magazine > 0 {
        score -= 0.3;
    }
    score.clamp(0.0, 1.0)
}

/// Teammates in need, unanswered distress, a failing leader, or loneliness
pub fn social_score(agent: &Agent, ctx: &TickContext) -> f32 {
    let traits = &agent.traits;
    let range = agent.vision_radius(&ctx.config.perception);
    let has_medkit = agent.state.inventory.has(UtilityKind::Medkit);
    let mut best: f32 = 0.0;

    if has_medkit
        && ctx.roster.iter().any(|m| {
            m.team == agent.team
                && m.is_alive()
                && (m.state.downed || m.state.hp_fraction() < 0.5)
                && m.position.distance(agent.position) <= range
        })
    {
        let medic = if agent.role == crate::core::types::Role::Medic {
            0.1
        } else {
            0.0
        };
        best = best.max(0.55 + 0.35 * traits.agreeableness + medic);
    }

    let can_answer = agent.memory.distress.values().any(|d| match d.kind {
        crate::perception::DistressKind::Medic => has_medkit,
        crate::perception::DistressKind::Ammo => {
            agent.state.inventory.weapon.reserve >= agent.state.inventory.weapon.magazine_size
        }
        crate::perception::DistressKind::Cover => false,
    });
    if can_answer {
        best = best.max(0.45 + 0.3 * traits.agreeableness);
    }

    if let Some(leader) = ctx.leader_of(agent.team).and_then(|id| ctx.roster.get(id)) {
        best = best.max(mutiny_score(agent, leader, &ctx.config.decision));
    }

    if agent.memory.hostiles.is_empty()
        && agent.state.social_battery < 40.0
        && ctx.roster.teammates(agent.team).next().is_some()
    {
        best = best.max(0.25 + 0.4 * traits.extraversion);
    }

    best.clamp(0.0, 1.0)
}

/// Competence and composure gap between a challenger and the leader
pub fn leadership_gap(challenger: &Agent, leader: &Agent) -> f32 {
    0.5 * (challenger.traits.leadership - leader.traits.leadership)
        + 0.5 * (leader.state.stress - challenger.state.stress) / 100.0
}

/// Desire to challenge the leader. Zero unless approval has collapsed and
/// the challenger is clearly better suited; extraverts push harder.
pub fn mutiny_score(agent: &Agent, leader: &Agent, config: &DecisionConfig) -> f32 {
    if agent.is_leader() || agent.id == leader.id || !agent.is_active() {
        return 0.0;
    }
    if agent.state.approval >= config.mutiny_approval {
        return 0.0;
    }
    let gap = leadership_gap(agent, leader);
    if gap <= config.mutiny_gap {
        return 0.0;
    }
    (0.4 + gap + 0.4 * agent.traits.extraversion).clamp(0.0, 1.0)
}

/// Score for keeping the current mode
pub fn stay_score(agent: &Agent, config: &DecisionConfig) -> f32 {
    config.inertia
        + config.conscientiousness_inertia * agent.traits.conscientiousness
        + config.fatigue_inertia * agent.state.fatigue
}
