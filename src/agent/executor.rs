//! Carry out the current action for one tick

use rand::Rng;

use crate::agent::combat::try_fire;
use crate::agent::movement::{face, hold, navigate, step_toward};
use crate::agent::{Action, Agent, FireMode, FireOutcome, MoveMode, ThrowKind, UtilityKind};
use crate::core::types::{AgentId, Vec2};
use crate::simulation::context::{Effect, Outbox, TickContext};
use crate::simulation::projectile::Projectile;

/// Distance kept while chatting with a teammate
const SOCIAL_DISTANCE: f32 = 30.0;

/// Execute `agent.action`. Actions that finish reset the agent to idle.
pub fn execute<R: Rng + ?Sized>(
    agent: &mut Agent,
    ctx: &TickContext,
    rng: &mut R,
    outbox: &mut Outbox,
) {
    if agent.state.is_incapacitated(ctx.now) {
        agent.velocity = Vec2::ZERO;
        return;
    }
    let stealthy = agent.role.prefers_stealth();
    let action = agent.action;
    let gait = action.move_mode(stealthy);

    match action {
        Action::Idle => scan(agent, ctx),
        Action::Move { target, .. } => {
            navigate(agent, target, gait, ctx);
            if agent.position.distance(target) <= ctx.config.pathfinding.waypoint_reach {
                agent.action = Action::Idle;
            }
        }
        Action::Attack {
            target,
            position,
            move_target,
        } => attack(agent, target, position, move_target, ctx, rng, outbox),
        Action::Suppress { target } => {
            agent.move_mode = gait;
            face(agent, target, ctx);
            if try_fire(agent, target, FireMode::Suppress, ctx, rng, outbox)
                == FireOutcome::FriendlyInLine
            {
                sidestep(agent, target, ctx);
            } else {
                hold(agent, ctx);
            }
        }
        Action::Throw { kind, target } => {
            throw(agent, kind, target, ctx, outbox);
            agent.action = Action::Idle;
        }
        Action::Heal { target } => heal(agent, target, gait, ctx, outbox),
        Action::Resupply { target } => {
            if let Some(mate) = reach(agent, target, gait, ctx) {
                let weapon = &mut agent.state.inventory.weapon;
                let rounds = weapon.reserve / 2;
                if rounds > 0 {
                    weapon.reserve -= rounds;
                    outbox.push(Effect::Resupply {
                        target: mate,
                        rounds,
                    });
                }
                agent.action = Action::Idle;
            }
        }
        Action::Retreat { target } => {
            navigate(agent, target, gait, ctx);
            if agent.position.distance(target) <= ctx.config.pathfinding.waypoint_reach {
                agent.action = Action::Idle;
            }
        }
        Action::Loot { cache, target } => {
            if !ctx.loot.iter().any(|c| c.id == cache) {
                agent.action = Action::Idle;
                return;
            }
            let range = agent.radius + ctx.config.combat.interact_range;
            if agent.position.distance(target) <= range {
                outbox.push(Effect::TakeLoot { cache });
                agent.action = Action::Idle;
            } else {
                navigate(agent, target, gait, ctx);
            }
        }
        Action::Mutiny { target } => {
            outbox.push(Effect::Mutiny { target });
            agent.action = Action::Idle;
        }
        Action::Socialize { target } => socialize(agent, target, gait, ctx, outbox),
    }
}

/// Stand and look toward the most likely threat
fn scan(agent: &mut Agent, ctx: &TickContext) {
    agent.move_mode = MoveMode::Jog;
    let look_at = agent
        .memory
        .known_enemy_center()
        .or_else(|| agent.memory.heat.hottest().map(|(p, _)| p));
    if let Some(point) = look_at {
        face(agent, point, ctx);
    }
    hold(agent, ctx);
}

/// Step sideways off the line of fire
fn sidestep(agent: &mut Agent, aim: Vec2, ctx: &TickContext) {
    let line = (aim - agent.position).normalize_or_zero();
    let side = if agent.id.0 % 2 == 0 {
        line.perp()
    } else {
        -line.perp()
    };
    let point = agent.position + side * agent.radius * 4.0;
    step_toward(agent, point, MoveMode::Jog, ctx);
}

#[allow(clippy::too_many_arguments)]
fn attack<R: Rng + ?Sized>(
    agent: &mut Agent,
    target: Option<AgentId>,
    position: Vec2,
    move_target: Option<Vec2>,
    ctx: &TickContext,
    rng: &mut R,
    outbox: &mut Outbox,
) {
    let live = target.and_then(|id| ctx.roster.get(id));
    if live.is_some_and(|enemy| !enemy.is_active()) {
        agent.action = Action::Idle;
        hold(agent, ctx);
        return;
    }
    // Track the target while it stays spotted, otherwise aim at the last fix
    let aim = match live {
        Some(enemy) if agent.memory.is_spotted(enemy.id) => enemy.position,
        _ => position,
    };

    agent.move_mode = if move_target.is_some() {
        MoveMode::Jog
    } else {
        MoveMode::Crawl
    };
    face(agent, aim, ctx);
    match try_fire(agent, aim, FireMode::Attack, ctx, rng, outbox) {
        FireOutcome::FriendlyInLine => sidestep(agent, aim, ctx),
        FireOutcome::OutOfRange => navigate(agent, aim, MoveMode::Jog, ctx),
        _ => match move_target {
            Some(goal) => navigate(agent, goal, MoveMode::Jog, ctx),
            None => hold(agent, ctx),
        },
    }
}

fn throw(agent: &mut Agent, kind: ThrowKind, target: Vec2, ctx: &TickContext, outbox: &mut Outbox) {
    let utility = match kind {
        ThrowKind::Grenade => UtilityKind::Grenade,
        ThrowKind::Smoke => UtilityKind::Smoke,
    };
    if !agent.state.inventory.take(utility) {
        return;
    }
    let offset = target - agent.position;
    let landing = agent.position + offset.clamp_length_max(ctx.config.decision.throw_range);
    face(agent, landing, ctx);
    tracing::debug!("{} throws {:?} toward {:?}", agent.id, kind, landing);
    outbox.push(Effect::Spawn(Projectile::thrown(
        agent.id,
        agent.team,
        kind,
        agent.position,
        landing,
        ctx.now,
        &ctx.config.combat,
    )));
    hold(agent, ctx);
}

/// Walk to a teammate; returns its id once within hand-off range.
/// Drops the action when the teammate is gone.
fn reach(agent: &mut Agent, target: AgentId, gait: MoveMode, ctx: &TickContext) -> Option<AgentId> {
    let Some(mate) = ctx.roster.get(target).filter(|m| m.is_alive()) else {
        agent.action = Action::Idle;
        return None;
    };
    let range = agent.radius + mate.radius + ctx.config.combat.interact_range;
    if agent.position.distance(mate.position) <= range {
        hold(agent, ctx);
        Some(mate.id)
    } else {
        navigate(agent, mate.position, gait, ctx);
        None
    }
}

fn heal(agent: &mut Agent, target: AgentId, gait: MoveMode, ctx: &TickContext, outbox: &mut Outbox) {
    if !agent.state.inventory.has(UtilityKind::Medkit) {
        agent.action = Action::Idle;
        return;
    }
    if target == agent.id {
        agent.state.inventory.take(UtilityKind::Medkit);
        agent.state.heal(&ctx.config.combat);
        agent.action = Action::Idle;
        hold(agent, ctx);
        return;
    }
    if let Some(patient) = reach(agent, target, gait, ctx) {
        agent.state.inventory.take(UtilityKind::Medkit);
        outbox.push(Effect::Heal { target: patient });
        agent.action = Action::Idle;
    }
}

fn socialize(agent: &mut Agent, target: AgentId, gait: MoveMode, ctx: &TickContext, outbox: &mut Outbox) {
    let Some(mate) = ctx.roster.get(target).filter(|m| m.is_active()) else {
        agent.action = Action::Idle;
        return;
    };
    if agent.position.distance(mate.position) > SOCIAL_DISTANCE {
        navigate(agent, mate.position, gait, ctx);
        return;
    }
    face(agent, mate.position, ctx);
    hold(agent, ctx);
    agent
        .state
        .add_social(ctx.config.body.social_gain * ctx.dt);
    outbox.push(Effect::Socialize { with: mate.id });
    if agent.state.social_battery >= 90.0 {
        agent.action = Action::Idle;
    }
}
