//! Action menus per mode
//!
//! A menu scores its candidates, the best one above the minimum bar wins,
//! otherwise the mode's fallback action is taken.

use crate::agent::combat::effective_accuracy;
use crate::agent::{
    Action, Agent, MovePurpose, ThrowKind, UtilityKind, STRESS_MAX, SUPPRESSION_MAX,
};
use crate::core::types::{AgentId, Vec2};
use crate::decision::scoring::mutiny_score;
use crate::decision::Mode;
use crate::perception::DistressKind;
use crate::simulation::context::TickContext;

/// How far a retreat runs from the threat
const RETREAT_DISTANCE: f32 = 160.0;
/// Fraction of the way toward the enemy a smoke screen lands
const SMOKE_FRACTION: f32 = 0.4;

/// A hostile worth shooting at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub id: AgentId,
    pub position: Vec2,
    pub visible: bool,
}

/// Nearest spotted, still-standing hostile; otherwise the nearest remembered one
pub fn pick_target(agent: &Agent, ctx: &TickContext) -> Option<Target> {
    let range = agent.vision_radius(&ctx.config.perception);
    let spotted = agent
        .memory
        .spotted()
        .filter_map(|id| ctx.roster.get(id))
        .filter(|enemy| enemy.is_active())
        .min_by(|a, b| {
            a.position
                .distance_squared(agent.position)
                .total_cmp(&b.position.distance_squared(agent.position))
        });
    if let Some(enemy) = spotted {
        let visible = ctx
            .grid
            .has_line_of_sight(agent.position, enemy.position, range, true);
        return Some(Target {
            id: enemy.id,
            position: enemy.position,
            visible,
        });
    }
    agent.memory.nearest_hostile(agent.position).map(|h| Target {
        id: h.id,
        position: h.position,
        visible: false,
    })
}

/// Centroid of the active squad including the agent itself
pub fn squad_centroid(agent: &Agent, ctx: &TickContext) -> Vec2 {
    let (sum, count) = ctx
        .roster
        .teammates(agent.team)
        .fold((agent.position, 1.0), |(sum, n), m| (sum + m.position, n + 1.0));
    sum / count
}

/// Unit vector pointing toward the team's home edge
fn home_direction(agent: &Agent) -> Vec2 {
    if agent.team.0 == 0 {
        Vec2::NEG_X
    } else {
        Vec2::X
    }
}

fn clamp_to_world(p: Vec2, ctx: &TickContext) -> Vec2 {
    let margin = ctx.grid.tile_size() * 2.0;
    p.clamp(Vec2::splat(margin), ctx.grid.size() - Vec2::splat(margin))
}

fn best_of(candidates: Vec<(Action, f32)>, min_score: f32, fallback: Action) -> Action {
    candidates
        .into_iter()
        .filter(|(_, score)| score.is_finite() && *score >= min_score)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(fallback, |(action, _)| action)
}

/// Choose a concrete action for the agent's current mode
pub fn choose_action(agent: &Agent, ctx: &TickContext) -> Action {
    let min = ctx.config.decision.min_action_score;
    match agent.mode {
        Mode::Idle => best_of(idle_menu(agent, ctx), min, Action::Idle),
        Mode::Combat => best_of(combat_menu(agent, ctx), min, Action::Idle),
        Mode::Survival => best_of(survival_menu(agent, ctx), min, retreat(agent, ctx)),
        Mode::Scavenge => best_of(scavenge_menu(agent, ctx), min, patrol(agent, ctx)),
        Mode::Social => best_of(social_menu(agent, ctx), min, Action::Idle),
    }
}

/// Walk toward the hottest suspected activity, or push toward the far side
fn patrol(agent: &Agent, ctx: &TickContext) -> Action {
    let target = match agent.memory.heat.hottest() {
        Some((hot, value)) if value > 0.5 => hot,
        _ => {
            let size = ctx.grid.size();
            let x = if agent.team.0 == 0 {
                size.x * 0.75
            } else {
                size.x * 0.25
            };
            Vec2::new(x, agent.position.y)
        }
    };
    Action::Move {
        target: clamp_to_world(target, ctx),
        purpose: MovePurpose::Patrol,
    }
}

fn retreat(agent: &Agent, ctx: &TickContext) -> Action {
    let away = match agent.memory.known_enemy_center() {
        Some(enemy) => (agent.position - enemy).normalize_or_zero(),
        None => Vec2::ZERO,
    };
    let mut direction = (away + home_direction(agent) * 0.5).normalize_or_zero();
    if direction == Vec2::ZERO {
        direction = home_direction(agent);
    }
    Action::Retreat {
        target: clamp_to_world(agent.position + direction * RETREAT_DISTANCE, ctx),
    }
}

pub fn idle_menu(agent: &Agent, ctx: &TickContext) -> Vec<(Action, f32)> {
    let decision = &ctx.config.decision;
    let traits = &agent.traits;
    let squad = ctx.squad(agent.team);
    let mut menu = Vec::new();

    if !agent.is_leader() && !ctx.in_chaos(agent.team) {
        if let Some(leader_at) = squad.and_then(|s| s.leader_position) {
            if leader_at.distance(agent.position) > decision.follow_distance {
                menu.push((
                    Action::Move {
                        target: leader_at,
                        purpose: MovePurpose::FollowOrder,
                    },
                    0.4 + 0.4 * traits.conscientiousness,
                ));
            }
        }
    }

    let centroid = squad_centroid(agent, ctx);
    if centroid.distance(agent.position) > decision.regroup_distance {
        menu.push((
            Action::Move {
                target: centroid,
                purpose: MovePurpose::Regroup,
            },
            0.3 + 0.3 * traits.agreeableness,
        ));
    }

    let lead = if agent.is_leader() || ctx.leader_of(agent.team).is_none() {
        0.2
    } else {
        0.0
    };
    menu.push((patrol(agent, ctx), 0.25 + 0.3 * traits.openness + lead));
    menu
}

pub fn combat_menu(agent: &Agent, ctx: &TickContext) -> Vec<(Action, f32)> {
    let decision = &ctx.config.decision;
    let traits = &agent.traits;
    let mut menu = Vec::new();
    let Some(target) = pick_target(agent, ctx) else {
        return menu;
    };
    let distance = target.position.distance(agent.position);
    let accuracy = effective_accuracy(agent);
    let shaky = accuracy < decision.low_accuracy;
    let has_ammo = agent.state.inventory.weapon.total_ammo() > 0;
    let range = agent.state.inventory.weapon.range;

    if has_ammo && target.visible {
        let move_target = (distance > range * 0.8).then_some(target.position);
        let mut score = 0.5 + 0.3 * accuracy + 0.2 * agent.state.morale / 100.0;
        if shaky {
            score -= 0.3;
        }
        menu.push((
            Action::Attack {
                target: Some(target.id),
                position: target.position,
                move_target,
            },
            score,
        ));
    } else if has_ammo {
        // Close in on the last known position
        menu.push((
            Action::Attack {
                target: Some(target.id),
                position: target.position,
                move_target: Some(target.position),
            },
            0.35 + 0.2 * traits.openness + 0.2 * agent.state.morale / 100.0,
        ));
    }

    if has_ammo {
        let mut score = 0.35;
        if shaky {
            score += 0.3;
        }
        let cover_cue = !ctx.in_chaos(agent.team)
            && ctx.roster.teammates(agent.team).any(|m| {
                m.action.is_advancing()
                    && m.position.distance(agent.position) <= ctx.config.memory.share_radius
            });
        if cover_cue {
            score += 0.25;
        }
        menu.push((
            Action::Suppress {
                target: target.position,
            },
            score,
        ));
    }

    if agent.state.inventory.has(UtilityKind::Grenade)
        && !target.visible
        && distance <= decision.throw_range
        && distance > ctx.config.combat.grenade_radius
    {
        menu.push((
            Action::Throw {
                kind: ThrowKind::Grenade,
                target: target.position,
            },
            0.55 + 0.2 * traits.openness,
        ));
    }

    let centroid = squad_centroid(agent, ctx);
    if centroid.distance(agent.position) > decision.regroup_distance {
        menu.push((
            Action::Move {
                target: centroid,
                purpose: MovePurpose::Regroup,
            },
            0.3 + 0.2 * traits.agreeableness,
        ));
    }
    menu
}

pub fn survival_menu(agent: &Agent, ctx: &TickContext) -> Vec<(Action, f32)> {
    let traits = &agent.traits;
    let state = &agent.state;
    let mut menu = vec![(
        retreat(agent, ctx),
        0.5 + 0.3 * state.stress / 100.0 + 0.2 * traits.neuroticism,
    )];

    if state.inventory.has(UtilityKind::Smoke) && (state.stress > 50.0 || state.suppression > 40.0)
    {
        // Screen first, then run: outranks a bare retreat for all but the
        // most neurotic
        let pressure = (state.stress / STRESS_MAX).max(state.suppression / SUPPRESSION_MAX);
        if let Some(enemy) = agent.memory.known_enemy_center() {
            let to_enemy = enemy - agent.position;
            let reach = (to_enemy.length() * SMOKE_FRACTION).min(ctx.config.decision.throw_range);
            menu.push((
                Action::Throw {
                    kind: ThrowKind::Smoke,
                    target: agent.position + to_enemy.normalize_or_zero() * reach,
                },
                0.6 + 0.4 * pressure,
            ));
        }
    }

    if state.inventory.has(UtilityKind::Medkit) && state.hp_fraction() < 0.6 {
        menu.push((
            Action::Heal { target: agent.id },
            0.6 + 0.4 * (1.0 - state.hp_fraction()),
        ));
    }
    menu
}

pub fn scavenge_menu(agent: &Agent, ctx: &TickContext) -> Vec<(Action, f32)> {
    let range = agent.vision_radius(&ctx.config.perception);
    let mut menu = Vec::new();
    let need = 1.0 - agent.state.inventory.weapon.ammo_fraction();

    if let Some(cache) = ctx
        .loot
        .iter()
        .filter(|c| c.ammo > 0 && c.position.distance(agent.position) <= range)
        .min_by(|a, b| {
            a.position
                .distance_squared(agent.position)
                .total_cmp(&b.position.distance_squared(agent.position))
        })
    {
        let distance = cache.position.distance(agent.position);
        menu.push((
            Action::Loot {
                cache: cache.id,
                target: cache.position,
            },
            0.5 + 0.3 * need - distance / 1000.0,
        ));
    }

    // Ask for ammo by closing on the nearest teammate; the distress call
    // itself is posted by the engine
    if let Some(mate) = ctx.roster.teammates(agent.team).min_by(|a, b| {
        a.position
            .distance_squared(agent.position)
            .total_cmp(&b.position.distance_squared(agent.position))
    }) {
        menu.push((
            Action::Move {
                target: mate.position,
                purpose: MovePurpose::Regroup,
            },
            0.45,
        ));
    }
    menu
}

pub fn social_menu(agent: &Agent, ctx: &TickContext) -> Vec<(Action, f32)> {
    let traits = &agent.traits;
    let range = agent.vision_radius(&ctx.config.perception);
    let mut menu = Vec::new();

    if agent.state.inventory.has(UtilityKind::Medkit) {
        let patient = ctx
            .roster
            .iter()
            .filter(|m| {
                m.team == agent.team
                    && m.is_alive()
                    && (m.state.downed || m.state.hp_fraction() < 0.5)
                    && m.position.distance(agent.position) <= range
            })
            .min_by(|a, b| a.state.hp.total_cmp(&b.state.hp));
        if let Some(patient) = patient {
            let called = agent
                .memory
                .distress
                .get(&patient.id)
                .is_some_and(|d| d.kind == DistressKind::Medic);
            menu.push((
                Action::Heal { target: patient.id },
                0.6 + 0.3 * traits.agreeableness + if called { 0.2 } else { 0.0 },
            ));
        }
    }

    let weapon = &agent.state.inventory.weapon;
    if weapon.reserve >= weapon.magazine_size {
        let asking = agent
            .memory
            .distress
            .iter()
            .find(|(_, d)| d.kind == DistressKind::Ammo)
            .map(|(id, _)| *id)
            .filter(|id| ctx.roster.get(*id).is_some_and(|m| m.is_active()));
        let starving = ctx
            .roster
            .teammates(agent.team)
            .find(|m| {
                m.state.inventory.weapon.ammo_fraction() < 0.2
                    && m.position.distance(agent.position) <= range
            })
            .map(|m| m.id);
        if let Some(target) = asking.or(starving) {
            menu.push((
                Action::Resupply { target },
                0.45 + 0.3 * traits.agreeableness,
            ));
        }
    }

    if let Some(leader) = ctx.leader_of(agent.team).and_then(|id| ctx.roster.get(id)) {
        let score = mutiny_score(agent, leader, &ctx.config.decision);
        if score > 0.0 {
            menu.push((Action::Mutiny { target: leader.id }, score));
        }
    }

    if agent.memory.hostiles.is_empty() && agent.state.social_battery < 50.0 {
        if let Some(mate) = ctx.roster.teammates(agent.team).min_by(|a, b| {
            a.position
                .distance_squared(agent.position)
                .total_cmp(&b.position.distance_squared(agent.position))
        }) {
            menu.push((
                Action::Socialize { target: mate.id },
                0.3 + 0.3 * traits.extraversion,
            ));
        }
    }
    menu
}
