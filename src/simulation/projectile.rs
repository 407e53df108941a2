//! Bullets, grenades and smoke canisters in flight

use ahash::AHashMap;
use serde::Serialize;

use crate::agent::{Agent, ThrowKind};
use crate::core::config::CombatConfig;
use crate::core::types::{angle_of, AgentId, CoverId, TeamId, Vec2};
use crate::map::{TileKind, WorldGrid};
use crate::spatial::{SpatialHandle, SpatialIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProjectileKind {
    Bullet,
    Grenade,
    Smoke,
}

impl From<ThrowKind> for ProjectileKind {
    fn from(kind: ThrowKind) -> Self {
        match kind {
            ThrowKind::Grenade => ProjectileKind::Grenade,
            ThrowKind::Smoke => ProjectileKind::Smoke,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Projectile {
    pub owner: AgentId,
    pub team: TeamId,
    pub kind: ProjectileKind,
    pub position: Vec2,
    /// Heading in radians
    pub heading: f32,
    pub speed: f32,
    pub damage: f32,
    /// Clock time at which a fused projectile goes off
    pub detonate_at: Option<f64>,
    /// Thrown projectiles stop here
    pub landing: Option<Vec2>,
    pub travelled: f32,
    pub max_range: f32,
    /// Covers at the muzzle the projectile may pass through
    pub pass_through: Vec<CoverId>,
    /// Agents already suppressed by this projectile
    #[serde(skip)]
    pub suppressed: Vec<AgentId>,
    pub active: bool,
}

/// What happened to a projectile during one advance
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectileOutcome {
    HitAgent {
        id: AgentId,
        damage: f32,
        from: Vec2,
    },
    HitCover {
        id: CoverId,
        position: Vec2,
    },
    HitWall {
        position: Vec2,
    },
    NearMiss {
        id: AgentId,
        angle: f32,
    },
    Detonate {
        kind: ThrowKind,
        position: Vec2,
    },
}

/// Covers close enough to a muzzle that a shot must not collide with them
pub fn covers_near(index: &SpatialIndex, position: Vec2, reach: f32) -> Vec<CoverId> {
    index
        .query_radius(position, reach)
        .into_iter()
        .filter_map(|e| match e.handle {
            SpatialHandle::Cover(id) if e.position.distance(position) <= reach + e.radius => {
                Some(id)
            }
            _ => None,
        })
        .collect()
}

impl Projectile {
    #[allow(clippy::too_many_arguments)]
    pub fn bullet(
        owner: AgentId,
        team: TeamId,
        position: Vec2,
        heading: f32,
        damage: f32,
        range: f32,
        pass_through: Vec<CoverId>,
        config: &CombatConfig,
    ) -> Self {
        Self {
            owner,
            team,
            kind: ProjectileKind::Bullet,
            position,
            heading,
            speed: config.bullet_speed,
            damage,
            detonate_at: None,
            landing: None,
            travelled: 0.0,
            max_range: range,
            pass_through,
            suppressed: Vec::new(),
            active: true,
        }
    }

    pub fn thrown(
        owner: AgentId,
        team: TeamId,
        kind: ThrowKind,
        from: Vec2,
        landing: Vec2,
        now: f64,
        config: &CombatConfig,
    ) -> Self {
        let fuse = match kind {
            ThrowKind::Grenade => config.grenade_fuse,
            ThrowKind::Smoke => config.smoke_fuse,
        };
        Self {
            owner,
            team,
            kind: kind.into(),
            position: from,
            heading: angle_of(landing - from),
            speed: config.grenade_speed,
            damage: match kind {
                ThrowKind::Grenade => config.grenade_damage,
                ThrowKind::Smoke => 0.0,
            },
            detonate_at: Some(now + fuse),
            landing: Some(landing),
            travelled: 0.0,
            max_range: f32::INFINITY,
            pass_through: Vec::new(),
            suppressed: Vec::new(),
            active: true,
        }
    }

    /// Advance one tick and report collisions, near misses and detonations
    #[allow(clippy::too_many_arguments)]
    pub fn advance(
        &mut self,
        dt: f32,
        now: f64,
        grid: &WorldGrid,
        index: &SpatialIndex,
        agents: &[Agent],
        lookup: &AHashMap<AgentId, usize>,
        config: &CombatConfig,
    ) -> Vec<ProjectileOutcome> {
        if !self.active {
            return Vec::new();
        }
        match self.kind {
            ProjectileKind::Bullet => self.advance_bullet(dt, grid, index, agents, lookup, config),
            ProjectileKind::Grenade | ProjectileKind::Smoke => self.advance_thrown(dt, now, grid),
        }
    }

    fn advance_bullet(
        &mut self,
        dt: f32,
        grid: &WorldGrid,
        index: &SpatialIndex,
        agents: &[Agent],
        lookup: &AHashMap<AgentId, usize>,
        config: &CombatConfig,
    ) -> Vec<ProjectileOutcome> {
        let mut outcomes = Vec::new();
        let dir = Vec2::from_angle(self.heading);
        let total = (self.speed * dt.max(0.0)).min(self.max_range - self.travelled);
        let step = grid.tile_size().max(1.0);
        let steps = (total / step).ceil().max(1.0) as usize;
        let len = total / steps as f32;
        let agent = |id: AgentId| lookup.get(&id).and_then(|&i| agents.get(i));

        for _ in 0..steps {
            self.position += dir * len;
            self.travelled += len;

            if !grid.in_bounds(self.position) {
                self.active = false;
                break;
            }
            match grid.tile_at(self.position) {
                TileKind::Wall => {
                    outcomes.push(ProjectileOutcome::HitWall {
                        position: self.position,
                    });
                    self.active = false;
                    break;
                }
                kind if kind.is_cover() => {
                    if let Some(id) = grid.cover_at(self.position) {
                        if !self.pass_through.contains(&id) {
                            outcomes.push(ProjectileOutcome::HitCover {
                                id,
                                position: self.position,
                            });
                            self.active = false;
                            break;
                        }
                    }
                }
                _ => {}
            }

            let hit = index
                .agents_within(self.position, 0.0)
                .into_iter()
                .filter(|id| *id != self.owner)
                .find(|id| agent(*id).is_some_and(|a| !a.state.dead && !a.state.downed));
            if let Some(id) = hit {
                outcomes.push(ProjectileOutcome::HitAgent {
                    id,
                    damage: self.damage,
                    from: self.position - dir * self.travelled.min(50.0),
                });
                self.active = false;
                break;
            }

            for id in index.agents_within(self.position, config.near_miss_radius) {
                if self.suppressed.contains(&id) {
                    continue;
                }
                let Some(target) = agent(id) else { continue };
                if target.team == self.team || target.state.dead {
                    continue;
                }
                self.suppressed.push(id);
                outcomes.push(ProjectileOutcome::NearMiss {
                    id,
                    // Direction the fire is coming from
                    angle: self.heading + std::f32::consts::PI,
                });
            }
        }

        if self.travelled >= self.max_range {
            self.active = false;
        }
        outcomes
    }

    fn advance_thrown(&mut self, dt: f32, now: f64, grid: &WorldGrid) -> Vec<ProjectileOutcome> {
        if let Some(landing) = self.landing {
            let remaining = landing - self.position;
            let travel = (self.speed * dt.max(0.0)).min(remaining.length());
            if travel > 0.0 {
                let next = self.position + remaining.normalize_or_zero() * travel;
                if grid.is_blocked_for_movement(next) {
                    self.speed = 0.0;
                } else {
                    self.position = next;
                    self.travelled += travel;
                }
            }
            // Thrown objects lose speed as they roll
            self.speed = (self.speed * (1.0 - 0.8 * dt)).max(0.0);
        }

        match (self.detonate_at, self.kind) {
            (Some(at), ProjectileKind::Grenade | ProjectileKind::Smoke) if now >= at => {
                self.active = false;
                let kind = if self.kind == ProjectileKind::Grenade {
                    ThrowKind::Grenade
                } else {
                    ThrowKind::Smoke
                };
                vec![ProjectileOutcome::Detonate {
                    kind,
                    position: self.position,
                }]
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Role;
    use crate::simulation::context::test_support::Scene;

    fn fly(projectile: &mut Projectile, scene: &Scene, dt: f32, ticks: usize) -> Vec<ProjectileOutcome> {
        let mut outcomes = Vec::new();
        let mut now = 0.0;
        for _ in 0..ticks {
            if !projectile.active {
                break;
            }
            now += dt as f64;
            outcomes.extend(projectile.advance(
                dt,
                now,
                &scene.grid,
                &scene.index,
                &scene.agents,
                &scene.lookup,
                &scene.config.combat,
            ));
        }
        outcomes
    }

    #[test]
    fn test_bullet_hits_agent_in_path() {
        let mut scene = Scene::open();
        let shooter = scene.add(0, Role::Rifleman, Vec2::new(100.0, 100.0));
        let enemy = scene.add(1, Role::Rifleman, Vec2::new(250.0, 100.0));
        scene.refresh();
        let mut bullet = Projectile::bullet(
            shooter,
            TeamId(0),
            Vec2::new(108.0, 100.0),
            0.0,
            25.0,
            400.0,
            Vec::new(),
            &scene.config.combat,
        );
        let outcomes = fly(&mut bullet, &scene, 0.05, 20);
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, ProjectileOutcome::HitAgent { id, .. } if *id == enemy)));
        assert!(!bullet.active);
    }

    #[test]
    fn test_bullet_stops_at_wall() {
        let mut scene = Scene::open();
        let shooter = scene.add(0, Role::Rifleman, Vec2::new(100.0, 100.0));
        for y in 0..100 {
            scene.grid.paint(40, y, TileKind::Wall);
        }
        scene.refresh();
        let mut bullet = Projectile::bullet(
            shooter,
            TeamId(0),
            Vec2::new(108.0, 100.0),
            0.0,
            25.0,
            400.0,
            Vec::new(),
            &scene.config.combat,
        );
        let outcomes = fly(&mut bullet, &scene, 0.05, 20);
        assert!(matches!(outcomes.last(), Some(ProjectileOutcome::HitWall { .. })));
        assert!(bullet.position.x >= 160.0 && bullet.position.x < 168.0);
    }

    #[test]
    fn test_near_miss_reported_once_per_enemy() {
        let mut scene = Scene::open();
        let shooter = scene.add(0, Role::Rifleman, Vec2::new(100.0, 100.0));
        let enemy = scene.add(1, Role::Rifleman, Vec2::new(200.0, 115.0));
        scene.add(0, Role::Rifleman, Vec2::new(200.0, 85.0));
        scene.refresh();
        let mut bullet = Projectile::bullet(
            shooter,
            TeamId(0),
            Vec2::new(108.0, 100.0),
            0.0,
            25.0,
            300.0,
            Vec::new(),
            &scene.config.combat,
        );
        let outcomes = fly(&mut bullet, &scene, 0.05, 20);
        let misses: Vec<_> = outcomes
            .iter()
            .filter_map(|o| match o {
                ProjectileOutcome::NearMiss { id, .. } => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(misses, vec![enemy]);
    }

    #[test]
    fn test_grenade_detonates_after_fuse_at_landing() {
        let mut scene = Scene::open();
        let thrower = scene.add(0, Role::Grenadier, Vec2::new(100.0, 100.0));
        scene.refresh();
        let landing = Vec2::new(160.0, 100.0);
        let mut grenade = Projectile::thrown(
            thrower,
            TeamId(0),
            ThrowKind::Grenade,
            Vec2::new(100.0, 100.0),
            landing,
            0.0,
            &scene.config.combat,
        );
        let early = fly(&mut grenade, &scene, 0.1, 10);
        assert!(early.is_empty());
        assert!(grenade.active);

        let outcomes = fly(&mut grenade, &scene, 0.5, 10);
        match outcomes.as_slice() {
            [ProjectileOutcome::Detonate {
                kind: ThrowKind::Grenade,
                position,
            }] => assert!(position.distance(landing) < 1.0),
            other => panic!("unexpected outcomes {other:?}"),
        }
    }
}
