//! Trigger pull: fire gating, friendly-fire scan, spread and muzzle effects

use rand::Rng;
use serde::Serialize;

use crate::agent::{Agent, FireMode, MoveMode};
use crate::core::config::CombatConfig;
use crate::core::types::{angle_between, angle_of, point_segment_distance, wrap_angle, Vec2};
use crate::simulation::context::{Effect, Outbox, TickContext};
use crate::simulation::events::{SimEvent, SoundKind};
use crate::simulation::projectile::{covers_near, Projectile};

/// Why a trigger pull did or did not produce a shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FireOutcome {
    Fired,
    Incapacitated,
    Reloading,
    /// Magazine and reserve are both empty
    NoAmmo,
    Cooldown,
    Sprinting,
    OutOfRange,
    OutOfArc,
    /// Concealed shooter holding fire for an ambush
    TriggerDiscipline,
    FriendlyInLine,
}

/// Accuracy after stress, in [0, 1]
pub fn effective_accuracy(agent: &Agent) -> f32 {
    (agent.traits.accuracy - agent.state.stress / 100.0 * 0.5).clamp(0.0, 1.0)
}

/// Is the shooter exposed enough that concealment no longer matters?
fn compromised(agent: &Agent, config: &CombatConfig) -> bool {
    agent.state.stress > config.compromised_stress
        || agent.state.suppression > config.compromised_suppression
}

/// Is an active teammate standing in the line of fire?
pub fn friendly_in_line(agent: &Agent, aim: Vec2, ctx: &TickContext) -> bool {
    let margin = ctx.config.combat.safety_margin;
    let line = aim - agent.position;
    let length_sq = line.length_squared();
    if length_sq <= f32::EPSILON {
        return false;
    }
    ctx.roster.teammates(agent.team).any(|mate| {
        let t = (mate.position - agent.position).dot(line) / length_sq;
        t > 0.0
            && t <= 1.0
            && point_segment_distance(mate.position, agent.position, aim) < mate.radius + margin
    })
}

/// Attempt one shot at `aim`.
///
/// Checks run in a fixed order and the first failing gate is reported. An
/// empty magazine starts a reload from reserve.
pub fn try_fire<R: Rng + ?Sized>(
    agent: &mut Agent,
    aim: Vec2,
    mode: FireMode,
    ctx: &TickContext,
    rng: &mut R,
    outbox: &mut Outbox,
) -> FireOutcome {
    let config = &ctx.config.combat;
    let now = ctx.now;

    if agent.state.is_incapacitated(now) {
        return FireOutcome::Incapacitated;
    }
    if agent.state.is_reloading(now) {
        return FireOutcome::Reloading;
    }
    if agent.state.inventory.weapon.magazine == 0 {
        return if agent.state.start_reload(now) {
            FireOutcome::Reloading
        } else {
            FireOutcome::NoAmmo
        };
    }
    if now < agent.state.next_fire_at {
        return FireOutcome::Cooldown;
    }
    if agent.move_mode == MoveMode::Sprint && agent.velocity.length_squared() > 1.0 {
        return FireOutcome::Sprinting;
    }

    let distance = agent.position.distance(aim);
    if distance > agent.state.inventory.weapon.range {
        return FireOutcome::OutOfRange;
    }
    let bearing = angle_of(aim - agent.position);
    let arc = match mode {
        FireMode::Attack => config.attack_arc,
        FireMode::Suppress => config.suppress_arc,
    };
    if angle_between(agent.facing, bearing) > arc {
        return FireOutcome::OutOfArc;
    }

    if ctx.grid.is_in_bush(agent.position)
        && agent.role.has_trigger_discipline()
        && distance > config.ambush_range
        && !compromised(agent, config)
    {
        return FireOutcome::TriggerDiscipline;
    }

    let negligent = agent.state.stress > config.negligence_stress
        && rng.gen::<f32>() < config.negligence_skip_chance;
    if !negligent && friendly_in_line(agent, aim, ctx) {
        return FireOutcome::FriendlyInLine;
    }

    let base_spread = match mode {
        FireMode::Attack => config.attack_spread,
        FireMode::Suppress => config.suppress_spread,
    };
    let spread = base_spread * (1.5 - effective_accuracy(agent));
    let jitter = if spread > 0.0 {
        rng.gen_range(-spread..=spread)
    } else {
        0.0
    };
    let offset = wrap_angle(bearing + jitter - agent.facing).clamp(-arc, arc);
    let heading = wrap_angle(agent.facing + offset);

    let weapon = &mut agent.state.inventory.weapon;
    let pass_through = covers_near(ctx.index, agent.position, agent.radius * 2.0);
    let muzzle = agent.position + Vec2::from_angle(heading) * agent.radius;
    outbox.push(Effect::Spawn(Projectile::bullet(
        agent.id,
        agent.team,
        muzzle,
        heading,
        weapon.damage,
        weapon.range,
        pass_through,
        config,
    )));
    weapon.magazine -= 1;
    agent.state.next_fire_at = now + agent.state.inventory.weapon.fire_interval;
    if agent.state.inventory.weapon.magazine == 0 {
        agent.state.start_reload(now);
    }

    outbox.push(Effect::Event(SimEvent::Sound {
        origin: agent.position,
        radius: config.gunshot_sound_radius,
        kind: SoundKind::Gunshot,
        source: Some(agent.id),
    }));
    FireOutcome::Fired
}
