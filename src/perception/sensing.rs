//! Sight and hearing for one agent

use ahash::AHashSet;

use crate::agent::Agent;
use crate::core::config::SimConfig;
use crate::core::types::{angle_between, angle_of, Vec2};
use crate::perception::detection::{detection_rate, DetectionInput};
use crate::simulation::context::{Effect, Outbox, TickContext};
use crate::simulation::events::{SimEvent, SoundKind};

/// Speed above which a target counts as moving for detection
const MOVING_SPEED: f32 = 2.0;

/// Run one throttled perception pass.
///
/// Meters of visible hostiles accumulate, everything else decays. Targets
/// crossing the threshold are announced once as first contact. Returns true
/// when at least one hostile is currently spotted.
pub fn perceive(agent: &mut Agent, ctx: &TickContext, outbox: &mut Outbox) -> bool {
    if ctx.now < agent.next_perception_at {
        return agent.memory.spotted().next().is_some();
    }
    let config = &ctx.config.perception;
    let dt = agent
        .last_perception_at
        .map_or(ctx.dt, |last| (ctx.now - last).max(0.0) as f32);
    agent.last_perception_at = Some(ctx.now);
    agent.next_perception_at = ctx.now + config.interval;

    let range = agent.vision_radius(config);
    let mut refreshed = AHashSet::new();
    let mut spotted_any = false;

    for id in ctx.index.agents_within(agent.position, range) {
        let Some(target) = ctx.roster.get(id) else {
            continue;
        };
        if target.team == agent.team || !target.is_alive() {
            continue;
        }
        let offset = target.position - agent.position;
        let distance = offset.length();
        let input = DetectionInput {
            distance,
            max_range: range,
            off_axis: angle_between(agent.facing, angle_of(offset)),
            target_moving: target.velocity.length() > MOVING_SPEED,
            target_in_bush: ctx.grid.is_in_bush(target.position),
            observer_stress: agent.state.stress,
            line_of_sight: ctx
                .grid
                .has_line_of_sight(agent.position, target.position, range, true),
        };
        let rate = detection_rate(&input, config);
        if rate <= 0.0 {
            continue;
        }

        refreshed.insert(id);
        if agent.memory.update_meter(id, rate, dt, config) {
            tracing::debug!("{} made first contact with {}", agent.id, id);
            outbox.push(Effect::Event(SimEvent::FirstContact {
                observer: agent.id,
                target: id,
            }));
            agent.react(ctx.now, ctx.config.decision.reaction_cooldown);
        }
        if agent.memory.is_spotted(id) {
            spotted_any = true;
            agent.memory.record_hostile(id, target.position, ctx.now);
            agent
                .memory
                .heat
                .raise_around(target.position, ctx.config.memory.spot_heat * dt);
        }
    }

    agent.memory.decay_meters_except(&refreshed, dt, config);
    map_surroundings(agent, ctx, range);

    if spotted_any {
        outbox.push(Effect::ShareHeat);
    }
    spotted_any || agent.memory.spotted().next().is_some()
}

/// Cast a fan of rays across the field of view and remember what they hit
fn map_surroundings(agent: &mut Agent, ctx: &TickContext, range: f32) {
    let rays = ctx.config.perception.mapping_rays;
    if rays == 0 {
        return;
    }
    let half = ctx.config.perception.fov_half_angle;
    for i in 0..rays {
        let t = if rays == 1 {
            0.5
        } else {
            i as f32 / (rays - 1) as f32
        };
        let angle = agent.facing - half + 2.0 * half * t;
        let hit = ctx.grid.ray_distance(agent.position, angle, range);
        if hit < range {
            agent
                .memory
                .mark_discovered(agent.position + Vec2::from_angle(angle) * hit);
        }
    }
}

/// Deliver one sound. Hostile sounds become danger zones and heat; any
/// explosion in earshot forces a reaction. Returns true if the agent heard it.
pub fn hear(
    agent: &mut Agent,
    origin: Vec2,
    radius: f32,
    kind: SoundKind,
    hostile: bool,
    now: f64,
    config: &SimConfig,
) -> bool {
    if !agent.is_active() || agent.position.distance(origin) > radius {
        return false;
    }
    if hostile {
        agent
            .memory
            .record_sound(origin, radius * 0.1, now, config.memory.sound_heat);
    }
    if kind == SoundKind::Explosion || (hostile && kind == SoundKind::Gunshot) {
        agent.react(now, config.decision.reaction_cooldown);
    }
    true
}
