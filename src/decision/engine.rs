//! Throttled mode re-evaluation and action selection

use rand::Rng;

use crate::agent::{Action, Agent};
use crate::core::config::DecisionConfig;
use crate::decision::actions::choose_action;
use crate::decision::mode::transitions;
use crate::decision::scoring::stay_score;
use crate::decision::Mode;
use crate::perception::DistressKind;
use crate::simulation::context::{Effect, Outbox, TickContext};

/// Seconds until the next re-evaluation: slower under stress and fatigue,
/// scaled by the agent's reaction speed, with multiplicative jitter
pub fn decision_interval<R: Rng + ?Sized>(agent: &Agent, config: &DecisionConfig, rng: &mut R) -> f64 {
    let base = config.base_interval
        + (agent.state.stress / 100.0) as f64 * config.stress_interval
        + agent.state.fatigue as f64 * config.fatigue_interval;
    let jitter = if config.jitter > 0.0 {
        rng.gen_range(-config.jitter..=config.jitter)
    } else {
        0.0
    };
    (base * agent.traits.reaction_scale() as f64 * (1.0 + jitter)).max(0.05)
}

/// Best next mode. Staying wins ties; a forced re-evaluation zeroes the
/// stay score. Followers lean toward the leader's mode outside command chaos.
pub fn select_mode(agent: &Agent, ctx: &TickContext, forced: bool) -> Mode {
    let config = &ctx.config.decision;
    let leader_mode = ctx
        .squad(agent.team)
        .filter(|_| !agent.is_leader() && !ctx.in_chaos(agent.team))
        .and_then(|squad| squad.leader_mode);

    let mut best = agent.mode;
    let mut best_score = if forced {
        0.0
    } else {
        stay_score(agent, config)
    };
    for (mode, score_fn) in transitions(agent.mode) {
        let mut score = score_fn(agent, ctx);
        if leader_mode == Some(*mode) {
            score += config.leader_bias;
        }
        if score > best_score {
            best = *mode;
            best_score = score;
        }
    }
    best
}

/// Re-evaluate mode and action when due. Returns true when a decision ran.
pub fn decide<R: Rng + ?Sized>(
    agent: &mut Agent,
    ctx: &TickContext,
    rng: &mut R,
    outbox: &mut Outbox,
) -> bool {
    if !agent.is_active() {
        return false;
    }
    if ctx.now < agent.next_decision_at && !agent.force_reevaluate {
        return false;
    }
    let forced = std::mem::take(&mut agent.force_reevaluate);

    let mode = select_mode(agent, ctx, forced);
    if mode != agent.mode {
        tracing::debug!(
            "{} switches {} -> {}",
            agent.id,
            agent.mode.name(),
            mode.name()
        );
        agent.mode = mode;
    }

    let action = choose_action(agent, ctx);
    if std::mem::discriminant(&action) != std::mem::discriminant(&agent.action) {
        agent.path.clear();
    }
    let interval = decision_interval(agent, &ctx.config.decision, rng);
    social_consequences(agent, &action, interval, ctx, outbox);
    agent.action = action;
    agent.next_decision_at = ctx.now + interval;
    true
}

/// Trust shifts and distress calls that follow from a decision
fn social_consequences(
    agent: &mut Agent,
    action: &Action,
    interval: f64,
    ctx: &TickContext,
    outbox: &mut Outbox,
) {
    let memory = &ctx.config.memory;
    let fighting_nearby: Vec<_> = ctx
        .roster
        .teammates(agent.team)
        .filter(|m| {
            m.mode == Mode::Combat && m.position.distance(agent.position) <= memory.share_radius
        })
        .map(|m| m.id)
        .collect();

    match action {
        Action::Retreat { .. } => {
            for observer in &fighting_nearby {
                outbox.push(Effect::Trust {
                    observer: *observer,
                    delta: -memory.trust_betrayal_loss,
                });
            }
        }
        Action::Attack { .. } | Action::Suppress { .. } | Action::Throw { .. } => {
            for observer in &fighting_nearby {
                outbox.push(Effect::Trust {
                    observer: *observer,
                    delta: memory.trust_hold_gain * interval as f32,
                });
            }
        }
        _ => {}
    }

    let call = if agent.mode == Mode::Scavenge && !matches!(action, Action::Loot { .. }) {
        Some(DistressKind::Ammo)
    } else if agent.state.downed
        || (agent.mode == Mode::Survival
            && agent.state.hp_fraction() < 0.5
            && !matches!(action, Action::Heal { .. }))
    {
        Some(DistressKind::Medic)
    } else if agent.state.pinned {
        Some(DistressKind::Cover)
    } else {
        None
    };
    if let Some(kind) = call {
        if ctx.now - agent.last_distress_at >= memory.distress_ttl {
            agent.last_distress_at = ctx.now;
            outbox.push(Effect::Distress {
                kind,
                position: agent.position,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AgentId, Role, TeamId, Vec2};
    use crate::simulation::context::test_support::Scene;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_interval_grows_with_stress() {
        let mut config = DecisionConfig::default();
        config.jitter = 0.0;
        let mut scene = Scene::open();
        scene.add(0, Role::Rifleman, Vec2::ZERO);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let calm = decision_interval(&scene.agents[0], &config, &mut rng);
        scene.agents[0].state.stress = 100.0;
        let stressed = decision_interval(&scene.agents[0], &config, &mut rng);
        assert!(stressed > calm);
    }

    #[test]
    fn test_decision_is_throttled() {
        let mut scene = Scene::open();
        scene.add(0, Role::Rifleman, Vec2::new(100.0, 100.0));
        scene.agents[0].next_decision_at = 5.0;
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut outbox = Outbox::new();
        let ran = scene.with_agent(0, 1.0, |a, ctx| decide(a, ctx, &mut rng, &mut outbox));
        assert!(!ran);

        scene.agents[0].force_reevaluate = true;
        let ran = scene.with_agent(0, 1.0, |a, ctx| decide(a, ctx, &mut rng, &mut outbox));
        assert!(ran);
        assert!(!scene.agents[0].force_reevaluate);
        assert!(scene.agents[0].next_decision_at > 1.0);
    }

    #[test]
    fn test_spotted_enemy_switches_to_combat() {
        let mut scene = Scene::open();
        scene.add(0, Role::Rifleman, Vec2::new(50.0, 200.0));
        let enemy = scene.add(1, Role::Rifleman, Vec2::new(250.0, 200.0));
        scene.agents[0]
            .memory
            .update_meter(enemy, 100.0, 1.0, &scene.config.perception);
        scene.agents[0]
            .memory
            .record_hostile(enemy, Vec2::new(250.0, 200.0), 1.0);
        let mode = scene.with_agent(0, 1.0, |a, ctx| select_mode(a, ctx, true));
        assert_eq!(mode, Mode::Combat);
    }

    #[test]
    fn test_stay_wins_without_pressure() {
        let mut scene = Scene::open();
        scene.add(0, Role::Rifleman, Vec2::new(50.0, 200.0));
        scene.agents[0].mode = Mode::Combat;
        scene.agents[0]
            .memory
            .record_hostile(AgentId(40), Vec2::new(300.0, 200.0), 1.0);
        let mode = scene.with_agent(0, 1.0, |a, ctx| select_mode(a, ctx, false));
        assert_eq!(mode, Mode::Combat);
    }

    #[test]
    fn test_followers_lean_toward_leader_mode_outside_chaos() {
        let mut scene = Scene::open();
        scene.add(0, Role::Rifleman, Vec2::new(50.0, 200.0));
        scene.config.decision.leader_bias = 5.0;
        let unled = scene.with_agent(0, 1.0, |a, ctx| select_mode(a, ctx, false));
        assert_ne!(unled, Mode::Scavenge);

        scene.squads.ensure(TeamId(0)).leader_mode = Some(Mode::Scavenge);
        let led = scene.with_agent(0, 1.0, |a, ctx| select_mode(a, ctx, false));
        assert_eq!(led, Mode::Scavenge);

        scene.squads.ensure(TeamId(0)).chaos_until = Some(4.0);
        let in_chaos = scene.with_agent(0, 1.0, |a, ctx| select_mode(a, ctx, false));
        assert_eq!(in_chaos, unled);
    }

    #[test]
    fn test_retreat_costs_trust_of_fighting_teammates() {
        let mut scene = Scene::open();
        scene.add(0, Role::Rifleman, Vec2::new(200.0, 200.0));
        let mate = scene.add(0, Role::Rifleman, Vec2::new(220.0, 200.0));
        scene.agents[1].mode = Mode::Combat;
        scene.agents[0].mode = Mode::Survival;
        let mut outbox = Outbox::new();
        scene.with_agent(0, 1.0, |a, ctx| {
            social_consequences(
                a,
                &Action::Retreat {
                    target: Vec2::ZERO,
                },
                0.5,
                ctx,
                &mut outbox,
            )
        });
        assert!(outbox.effects().iter().any(|e| matches!(
            e,
            Effect::Trust { observer, delta } if *observer == mate && *delta < 0.0
        )));
    }
}
