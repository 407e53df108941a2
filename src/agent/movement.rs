//! Locomotion: speed model, stamina, steering and wall sliding

use crate::agent::{Agent, MoveMode, ResourceState};
use crate::core::config::BodyConfig;
use crate::core::types::{angle_of, wrap_angle, Vec2};
use crate::map::WorldGrid;
use crate::pathfinding::PathRequest;
use crate::simulation::context::TickContext;

/// Arrival tolerance for direct steering
const ARRIVE_DISTANCE: f32 = 2.0;

pub fn base_speed(mode: MoveMode, config: &BodyConfig) -> f32 {
    match mode {
        MoveMode::Sprint => config.sprint_speed,
        MoveMode::Jog => config.jog_speed,
        MoveMode::Sneak => config.sneak_speed,
        MoveMode::Crawl => config.crawl_speed,
    }
}

fn stamina_cost(mode: MoveMode, config: &BodyConfig) -> f32 {
    match mode {
        MoveMode::Sprint => config.sprint_cost,
        MoveMode::Jog => config.jog_cost,
        MoveMode::Sneak => config.sneak_cost,
        MoveMode::Crawl => config.crawl_cost,
    }
}

/// Two-stage falloff: full above 50 %, three quarters above 20 %, half below
pub fn stamina_factor(state: &ResourceState) -> f32 {
    match state.stamina_fraction() {
        f if f > 0.5 => 1.0,
        f if f > 0.2 => 0.75,
        _ => 0.5,
    }
}

/// Adrenaline above one threshold, panic flight above another
pub fn stress_factor(stress: f32, config: &BodyConfig) -> f32 {
    if stress > config.panic_stress {
        config.panic_boost
    } else if stress > config.adrenaline_stress {
        config.adrenaline_boost
    } else {
        1.0
    }
}

/// Current top speed of an agent in world units per second
pub fn movement_speed(agent: &Agent, mode: MoveMode, grid: &WorldGrid, config: &BodyConfig) -> f32 {
    let state = &agent.state;
    if state.downed || state.dead {
        return 0.0;
    }
    let mut speed = base_speed(mode, config)
        * agent.role.speed_modifier()
        * stamina_factor(state)
        * stress_factor(state.stress, config)
        * (1.0 - config.suppression_slowdown * state.suppression / 100.0).max(0.0);
    if state.hp_fraction() < config.wounded_fraction {
        speed *= config.wounded_speed;
    }
    if state.pinned {
        speed *= config.pinned_speed;
    }
    if grid.is_in_bush(agent.position) {
        speed *= config.bush_speed;
    }
    if speed.is_finite() {
        speed.max(0.0)
    } else {
        0.0
    }
}

/// Spend or recover stamina for one tick. Fatigue slows recovery.
pub fn update_stamina(state: &mut ResourceState, mode: Option<MoveMode>, dt: f32, config: &BodyConfig) {
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    let recovery_scale = 1.0 - state.fatigue.clamp(0.0, 1.0);
    let delta = match mode {
        Some(mode) => {
            let cost = stamina_cost(mode, config);
            state.fatigue += cost * dt * config.fatigue_gain;
            (config.moving_recovery * recovery_scale - cost) * dt
        }
        None => {
            state.fatigue -= config.fatigue_recovery * dt;
            config.idle_recovery * recovery_scale * dt
        }
    };
    state.stamina = (state.stamina + delta).clamp(0.0, state.stamina_max);
    state.fatigue = state.fatigue.clamp(0.0, 1.0);
}

/// Rotate toward `desired` with low-pass smoothing and a turn-rate cap
pub fn turn_toward(facing: f32, desired: f32, dt: f32, config: &BodyConfig) -> f32 {
    let error = wrap_angle(desired - facing);
    let smoothed = error * config.heading_smoothing.clamp(0.0, 1.0);
    let cap = config.turn_rate * dt.max(0.0);
    // Never stall when the smoothed step falls below a tiny fraction
    let step = if smoothed.abs() < cap * 0.1 {
        error.clamp(-cap, cap)
    } else {
        smoothed.clamp(-cap, cap)
    };
    wrap_angle(facing + step)
}

/// Move a circle by `delta`, sliding along walls one axis at a time
pub fn slide(grid: &WorldGrid, position: Vec2, delta: Vec2, radius: f32) -> Vec2 {
    let mut next = position;
    let try_x = Vec2::new(next.x + delta.x, next.y);
    if !grid.circle_blocked(try_x, radius) {
        next = try_x;
    }
    let try_y = Vec2::new(next.x, next.y + delta.y);
    if !grid.circle_blocked(try_y, radius) {
        next = try_y;
    }
    next
}

/// Push away from close teammates, biased perpendicular to the line toward
/// the known enemy so squads spread into a firing line instead of a column.
fn separation(agent: &Agent, ctx: &TickContext) -> Vec2 {
    let config = &ctx.config.body;
    let mut push = Vec2::ZERO;
    for other in ctx.roster.teammates(agent.team) {
        let offset = agent.position - other.position;
        let distance = offset.length();
        if distance <= f32::EPSILON || distance >= config.separation_radius {
            continue;
        }
        push += offset / distance * (1.0 - distance / config.separation_radius);
    }
    if let Some(enemy) = agent.memory.known_enemy_center() {
        let axis = (enemy - agent.position).normalize_or_zero();
        if axis != Vec2::ZERO {
            let perp = axis.perp();
            let lateral = perp * push.dot(perp);
            let frontal = axis * push.dot(axis);
            push = lateral + frontal * 0.3;
        }
    }
    push * config.separation_weight
}

/// Walk toward `target` along a planned path for one tick
pub fn navigate(agent: &mut Agent, target: Vec2, mode: MoveMode, ctx: &TickContext) {
    agent.move_mode = mode;
    if agent.position.distance(target) <= ARRIVE_DISTANCE {
        hold(agent, ctx);
        return;
    }
    let request = PathRequest {
        start: agent.position,
        goal: target,
        radius: agent.radius,
        prefers_stealth: agent.role.prefers_stealth(),
        heat: Some(&agent.memory.heat),
    };
    let steer = agent
        .path
        .steer_point(ctx.grid, &request, &ctx.config.pathfinding);
    step_toward(agent, steer, mode, ctx);
}

/// Move straight at `point` (no path planning) for one tick
pub fn step_toward(agent: &mut Agent, point: Vec2, mode: MoveMode, ctx: &TickContext) {
    let config = &ctx.config.body;
    let dt = ctx.dt;
    let speed = movement_speed(agent, mode, ctx.grid, config);
    let direction = (point - agent.position).normalize_or_zero() + separation(agent, ctx);
    let direction = direction.normalize_or_zero();
    if direction == Vec2::ZERO || speed <= 0.0 {
        hold(agent, ctx);
        return;
    }

    agent.facing = turn_toward(agent.facing, angle_of(direction), dt, config);
    let remaining = agent.position.distance(point);
    let delta = direction * (speed * dt).min(remaining.max(ARRIVE_DISTANCE));
    let before = agent.position;
    agent.position = slide(ctx.grid, agent.position, delta, agent.radius);
    agent.velocity = if dt > 0.0 {
        (agent.position - before) / dt
    } else {
        Vec2::ZERO
    };
    update_stamina(&mut agent.state, Some(mode), dt, config);
}

/// Stand still this tick, still drifting apart from crowding teammates
pub fn hold(agent: &mut Agent, ctx: &TickContext) {
    let push = separation(agent, ctx) * ctx.config.body.crawl_speed * ctx.dt;
    if push != Vec2::ZERO && agent.is_active() {
        agent.position = slide(ctx.grid, agent.position, push, agent.radius);
    }
    agent.velocity = Vec2::ZERO;
    update_stamina(&mut agent.state, None, ctx.dt, &ctx.config.body);
}

/// Turn in place toward a point
pub fn face(agent: &mut Agent, point: Vec2, ctx: &TickContext) {
    let to = point - agent.position;
    if to.length_squared() > f32::EPSILON {
        agent.facing = turn_toward(agent.facing, angle_of(to), ctx.dt, &ctx.config.body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::TileKind;

    #[test]
    fn test_stamina_factor_stages() {
        let mut state = ResourceState::new(crate::core::types::Role::Rifleman, &BodyConfig::default());
        state.stamina = 80.0;
        assert_eq!(stamina_factor(&state), 1.0);
        state.stamina = 40.0;
        assert_eq!(stamina_factor(&state), 0.75);
        state.stamina = 10.0;
        assert_eq!(stamina_factor(&state), 0.5);
    }

    #[test]
    fn test_stress_factor_thresholds() {
        let config = BodyConfig::default();
        assert_eq!(stress_factor(10.0, &config), 1.0);
        assert_eq!(stress_factor(70.0, &config), config.adrenaline_boost);
        assert_eq!(stress_factor(95.0, &config), config.panic_boost);
    }

    #[test]
    fn test_sprinting_drains_and_idling_recovers() {
        let config = BodyConfig::default();
        let mut state = ResourceState::new(crate::core::types::Role::Rifleman, &config);
        update_stamina(&mut state, Some(MoveMode::Sprint), 1.0, &config);
        let after_sprint = state.stamina;
        assert!(after_sprint < config.stamina_max);
        update_stamina(&mut state, None, 1.0, &config);
        assert!(state.stamina > after_sprint);
    }

    #[test]
    fn test_fatigue_slows_recovery() {
        let config = BodyConfig::default();
        let mut fresh = ResourceState::new(crate::core::types::Role::Rifleman, &config);
        let mut tired = fresh.clone();
        fresh.stamina = 10.0;
        tired.stamina = 10.0;
        tired.fatigue = 0.8;
        update_stamina(&mut fresh, None, 1.0, &config);
        update_stamina(&mut tired, None, 1.0, &config);
        assert!(fresh.stamina > tired.stamina);
    }

    #[test]
    fn test_turn_is_rate_limited() {
        let config = BodyConfig::default();
        let facing = turn_toward(0.0, std::f32::consts::PI * 0.9, 0.016, &config);
        assert!(facing.abs() <= config.turn_rate * 0.016 + 1e-5);
        assert!(facing > 0.0);
    }

    #[test]
    fn test_slide_along_wall() {
        let mut grid = WorldGrid::new(50, 50, 4.0, 2.0);
        // Vertical wall at x = 25
        for y in 0..50 {
            grid.paint(25, y, TileKind::Wall);
        }
        let start = Vec2::new(90.0, 100.0);
        let next = slide(&grid, start, Vec2::new(10.0, 5.0), 4.0);
        assert_eq!(next.x, start.x);
        assert_eq!(next.y, 105.0);
    }
}
