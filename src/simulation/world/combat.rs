//! Shots, blasts and wounds: projectile outcomes and damage applied to agents

use rand::Rng;
use tracing::{debug, info};

use super::World;
use crate::agent::{try_fire, Action, DamageOutcome, FireMode, FireOutcome, ThrowKind};
use crate::core::types::{angle_of, AgentId, CoverId, Vec2};
use crate::map::{CoverDestroyed, SmokeCloud};
use crate::perception::DistressKind;
use crate::simulation::context::{Outbox, Roster, TickContext};
use crate::simulation::events::{SimEvent, SoundKind};
use crate::simulation::projectile::ProjectileOutcome;
use crate::simulation::snapshot::{FlashEffect, FlashKind};

impl World {
    pub(super) fn advance_projectiles(&mut self, now: f64, dt: f32) {
        if self.projectiles.is_empty() {
            return;
        }
        let lookup = self.lookup();
        let mut outcomes = Vec::new();
        for projectile in &mut self.projectiles {
            let owner = projectile.owner;
            for outcome in projectile.advance(
                dt,
                now,
                &self.grid,
                &self.index,
                &self.agents,
                &lookup,
                &self.config.combat,
            ) {
                outcomes.push((owner, outcome));
            }
        }
        self.projectiles.retain(|p| p.active);

        let ttl = self.config.world.effect_ttl;
        for (owner, outcome) in outcomes {
            match outcome {
                ProjectileOutcome::HitAgent { id, damage, from } => {
                    self.stats.hits += 1;
                    if let Some(at) = self.agent(id).map(|a| a.position) {
                        self.flash(at, 4.0, FlashKind::Impact, now + ttl);
                    }
                    self.damage_agent(id, damage, from, now);
                }
                ProjectileOutcome::HitCover { id, position } => {
                    self.flash(position, 3.0, FlashKind::Impact, now + ttl);
                    let amount = self.config.combat.cover_bullet_damage;
                    if let Some(destroyed) = self.grid.damage_cover(id, amount) {
                        self.cover_destroyed(destroyed);
                    }
                }
                ProjectileOutcome::HitWall { position } => {
                    self.flash(position, 3.0, FlashKind::Impact, now + ttl);
                }
                ProjectileOutcome::NearMiss { id, angle } => {
                    let Some(i) = self.index_of(id) else {
                        continue;
                    };
                    let combat = &self.config.combat;
                    let agent = &mut self.agents[i];
                    agent.state.suppress(
                        combat.near_miss_suppression,
                        combat.near_miss_stress,
                        angle,
                        now,
                        &self.config.body,
                        combat,
                    );
                    agent.react(now, self.config.decision.reaction_cooldown);
                }
                ProjectileOutcome::Detonate { kind, position } => {
                    self.detonate(owner, kind, position, now);
                }
            }
        }
    }

    pub(super) fn detonate(&mut self, owner: AgentId, kind: ThrowKind, position: Vec2, now: f64) {
        let ttl = self.config.world.effect_ttl;
        match kind {
            ThrowKind::Smoke => {
                let radius = self.config.world.smoke_radius;
                self.grid.add_smoke(SmokeCloud {
                    center: position,
                    radius,
                    expires_at: now + self.config.world.smoke_duration,
                });
                self.events.emit(SimEvent::Explosion {
                    position,
                    radius,
                    kind,
                });
                self.flash(position, radius, FlashKind::Smoke, now + self.config.world.smoke_duration);
                debug!("Smoke deployed at {:?}", position);
            }
            ThrowKind::Grenade => {
                let combat = self.config.combat.clone();
                self.stats.explosions += 1;
                self.events.emit(SimEvent::Explosion {
                    position,
                    radius: combat.grenade_radius,
                    kind,
                });
                self.events.emit(SimEvent::Sound {
                    origin: position,
                    radius: combat.explosion_sound_radius,
                    kind: SoundKind::Explosion,
                    source: Some(owner),
                });
                self.flash(position, combat.grenade_radius, FlashKind::Blast, now + ttl);

                // Walls shelter, cover and bushes do not
                let victims: Vec<(AgentId, Vec2)> = self
                    .agents
                    .iter()
                    .filter(|a| a.is_alive())
                    .filter_map(|a| {
                        let distance = a.position.distance(position);
                        if distance > combat.grenade_radius + a.radius {
                            return None;
                        }
                        let angle = angle_of(a.position - position);
                        let open = self.grid.ray_distance(position, angle, distance) >= distance;
                        open.then_some((a.id, a.position))
                    })
                    .collect();
                for (id, at) in victims {
                    let falloff = (1.0 - at.distance(position) / combat.grenade_radius).clamp(0.0, 1.0);
                    self.damage_agent(id, combat.grenade_damage * falloff, position, now);
                    if let Some(i) = self.index_of(id) {
                        let agent = &mut self.agents[i];
                        agent.state.suppress(
                            combat.explosion_suppression,
                            combat.explosion_stress,
                            angle_of(position - at),
                            now,
                            &self.config.body,
                            &combat,
                        );
                        agent.react(now, self.config.decision.reaction_cooldown);
                    }
                }

                let covers: Vec<(CoverId, f32)> = self
                    .grid
                    .covers()
                    .iter()
                    .filter(|c| c.center.distance(position) <= combat.grenade_radius + c.radius)
                    .map(|c| {
                        let falloff =
                            (1.0 - c.center.distance(position) / (combat.grenade_radius + c.radius)).clamp(0.2, 1.0);
                        (c.id, falloff)
                    })
                    .collect();
                for (id, falloff) in covers {
                    if let Some(destroyed) = self.grid.damage_cover(id, combat.grenade_cover_damage * falloff) {
                        self.cover_destroyed(destroyed);
                    }
                }
                info!("Grenade from {} detonated at {:?}", owner, position);
            }
        }
    }

    fn cover_destroyed(&mut self, destroyed: CoverDestroyed) {
        info!("Cover {} destroyed at {:?}", destroyed.id.0, destroyed.position);
        self.stats.covers_destroyed += 1;
        self.events.emit(SimEvent::CoverDestroyed {
            id: destroyed.id,
            position: destroyed.position,
        });
    }

    fn flash(&mut self, position: Vec2, radius: f32, kind: FlashKind, expires_at: f64) {
        self.flashes.push(FlashEffect {
            position,
            radius,
            kind,
            expires_at,
        });
    }

    /// Fire one round from `shooter` at `target`'s current position,
    /// turning the shooter to face it first. None when either is unknown.
    pub fn fire_at(&mut self, shooter: AgentId, target: AgentId, mode: FireMode) -> Option<FireOutcome> {
        let now = self.clock.now();
        let aim = self.agent(target)?.position;
        let si = self.index_of(shooter)?;
        self.rebuild_index();
        let lookup = self.lookup();

        let mut outbox = Outbox::new();
        let outcome = {
            let (before, rest) = self.agents.split_at_mut(si);
            let (me, after) = rest.split_first_mut()?;
            let to = aim - me.position;
            if to.length_squared() > 1e-6 {
                me.facing = angle_of(to);
            }
            let ctx = TickContext {
                config: &self.config,
                grid: &self.grid,
                index: &self.index,
                roster: Roster::new(before, after, &lookup, si),
                loot: &self.loot,
                squads: &self.squads,
                now,
                dt: 0.0,
            };
            try_fire(me, aim, mode, &ctx, &mut self.rng, &mut outbox)
        };
        self.apply_effects(si, &mut outbox, now, 0.0);
        Some(outcome)
    }

    /// Damage an agent directly, as if hit from `from`
    pub fn apply_damage(&mut self, id: AgentId, amount: f32, from: Vec2) -> DamageOutcome {
        let now = self.clock.now();
        self.damage_agent(id, amount, from, now)
    }

    fn damage_agent(&mut self, id: AgentId, amount: f32, from: Vec2, now: f64) -> DamageOutcome {
        let shock_roll: f32 = self.rng.gen();
        let Some(i) = self.index_of(id) else {
            return DamageOutcome::Ignored;
        };
        let cooldown = self.config.decision.reaction_cooldown;
        let agent = &mut self.agents[i];
        let outcome = agent.state.take_damage(
            amount,
            agent.traits.neuroticism,
            shock_roll,
            now,
            &self.config.combat,
        );
        match outcome {
            DamageOutcome::Hurt => {
                agent.memory.heat.raise_around(from, self.config.memory.sound_heat);
                agent.react(now, cooldown);
            }
            DamageOutcome::Downed => {
                info!("{} is down at {:?}", id, agent.position);
                agent.action = Action::Idle;
                agent.path.clear();
                agent.velocity = Vec2::ZERO;
                let (team, position) = (agent.team, agent.position);
                self.stats.downed += 1;
                self.events.emit(SimEvent::Downed { id, position });
                self.broadcast_distress(id, team, position, DistressKind::Medic, position, now);
            }
            DamageOutcome::Died => debug!("{} was finished off", id),
            DamageOutcome::Ignored => {}
        }
        outcome
    }
}
