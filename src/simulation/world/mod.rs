//! World orchestrator - advances every agent, projectile and effect by one tick
//!
//! Tick phases, in order:
//! index rebuild -> corpse removal -> leader buff -> agent updates (with
//! effects applied right after each agent) -> sound delivery -> overlap
//! correction on a fresh index -> projectiles -> effect aging -> elections.
//!
//! Projectile outcomes and damage live in `combat`.

use ahash::AHashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::agent::{Agent, Traits};
use crate::core::clock::{Clock, WallClock};
use crate::core::config::SimConfig;
use crate::core::error::Result;
use crate::core::types::{AgentId, LootId, Role, TeamId, Vec2};
use crate::map::{LoadedMap, MapDescription, SpawnPoints, WorldGrid};
use crate::perception::{hear, DistressKind};
use crate::simulation::context::{Effect, Outbox, Roster, TickContext};
use crate::simulation::events::{EventBus, SimEvent};
use crate::simulation::loot::LootCache;
use crate::simulation::projectile::{Projectile, ProjectileKind};
use crate::simulation::snapshot::{AgentSnapshot, FlashEffect, ProjectileSnapshot, WorldStats};
use crate::simulation::squad::{elect, mutiny_succeeds, SquadBoard, SquadState};
use crate::simulation::update::update_agent;
use crate::spatial::{SpatialEntry, SpatialHandle, SpatialIndex};

mod combat;

/// Longest step a single tick may take, in seconds
pub const MAX_DT: f32 = 0.25;

/// Radius of the dread zone left where a teammate died
const DREAD_RADIUS: f32 = 60.0;

/// Approval of the leader lost by witnesses of a teammate's death
const DEATH_APPROVAL_LOSS: f32 = 0.1;

/// Approval of the leader gained when an enemy falls
const KILL_APPROVAL_GAIN: f32 = 0.05;

/// Approval gained per second near the leader
const LEADER_APPROVAL_GAIN: f32 = 0.02;

/// Approval every follower holds after a change of command
const FRESH_APPROVAL: f32 = 0.6;

const TEAMS: [TeamId; 2] = [TeamId(0), TeamId(1)];

pub struct World {
    config: SimConfig,
    grid: WorldGrid,
    spawns: SpawnPoints,
    index: SpatialIndex,
    agents: Vec<Agent>,
    projectiles: Vec<Projectile>,
    loot: Vec<LootCache>,
    squads: SquadBoard,
    events: EventBus,
    flashes: Vec<FlashEffect>,
    clock: Box<dyn Clock>,
    rng: ChaCha8Rng,
    next_agent_id: u32,
    next_loot_id: u32,
    stats: WorldStats,
}

impl World {
    /// World over `map`, seeded from entropy and driven by wall time
    pub fn new(config: SimConfig, map: LoadedMap) -> Self {
        Self::build(config, map, ChaCha8Rng::from_entropy())
    }

    /// Deterministic randomness; pair with a `ManualClock` for replays
    pub fn with_seed(config: SimConfig, map: LoadedMap, seed: u64) -> Self {
        Self::build(config, map, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Validate and rasterize a map description, then build the world
    pub fn from_map(config: SimConfig, description: &MapDescription, seed: Option<u64>) -> Result<Self> {
        config.validate()?;
        description.validate()?;
        let map = description.rasterize(&config.world);
        Ok(match seed {
            Some(seed) => Self::with_seed(config, map, seed),
            None => Self::new(config, map),
        })
    }

    fn build(config: SimConfig, map: LoadedMap, rng: ChaCha8Rng) -> Self {
        let index = SpatialIndex::new(map.grid.size(), config.spatial.cell_size);
        Self {
            config,
            grid: map.grid,
            spawns: map.spawns,
            index,
            agents: Vec::new(),
            projectiles: Vec::new(),
            loot: Vec::new(),
            squads: SquadBoard::new(),
            events: EventBus::new(),
            flashes: Vec::new(),
            clock: Box::new(WallClock::new()),
            rng,
            next_agent_id: 1,
            next_loot_id: 1,
            stats: WorldStats::default(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id == id)
    }

    pub fn loot(&self) -> &[LootCache] {
        &self.loot
    }

    pub fn flashes(&self) -> &[FlashEffect] {
        &self.flashes
    }

    pub fn stats(&self) -> WorldStats {
        self.stats
    }

    pub fn squad(&self, team: TeamId) -> Option<&SquadState> {
        self.squads.get(team)
    }

    pub fn leader_of(&self, team: TeamId) -> Option<AgentId> {
        self.squads.get(team).and_then(|s| s.leader)
    }

    /// Living, non-downed members of `team`
    pub fn survivors(&self, team: TeamId) -> usize {
        self.agents
            .iter()
            .filter(|a| a.team == team && a.is_active())
            .count()
    }

    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        self.agents.iter().map(AgentSnapshot::from).collect()
    }

    pub fn projectiles(&self) -> Vec<ProjectileSnapshot> {
        self.projectiles
            .iter()
            .filter(|p| p.active)
            .map(|p| ProjectileSnapshot {
                kind: p.kind,
                position: p.position,
                heading: p.heading,
            })
            .collect()
    }

    /// Events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    /// Add one agent with rolled personality traits
    pub fn spawn_agent(&mut self, team: TeamId, role: Role, position: Vec2) -> AgentId {
        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;
        let traits = Traits::roll(&mut self.rng);
        let agent = Agent::new(
            id,
            team,
            role,
            position,
            traits,
            &self.config,
            self.grid.size(),
        );
        debug!("Spawned {} ({:?}) for team {} at {:?}", id, role, team.0, position);
        self.squads.ensure(team);
        self.agents.push(agent);
        id
    }

    /// Spawn `per_team` agents for each side at the map's spawn points and
    /// elect the first leaders
    pub fn spawn_squads(&mut self, per_team: usize) {
        for team in TEAMS {
            for k in 0..per_team {
                let position = self.spawn_position(team, k);
                self.spawn_agent(team, Role::squad_rotation(k), position);
            }
        }
        info!(
            "Spawned {} agents per team on a {}x{} grid",
            per_team,
            self.grid.width(),
            self.grid.height()
        );
        let now = self.clock.now();
        self.run_elections(now);
    }

    /// Spawn point `k` for `team`, stacking extra agents in rings around the
    /// map's points and falling back to the team's edge of the map
    fn spawn_position(&self, team: TeamId, k: usize) -> Vec2 {
        let points = self.spawns.for_team(team);
        let spacing = self.config.body.radius * 3.0;
        let (base, ring) = if points.is_empty() {
            let size = self.grid.size();
            let x = if team.0 == 0 { size.x * 0.1 } else { size.x * 0.9 };
            (Vec2::new(x, size.y * 0.5), k)
        } else {
            (points[k % points.len()], k / points.len())
        };
        if ring == 0 {
            return base;
        }
        let side = if ring % 2 == 0 { 1.0 } else { -1.0 };
        let step = ring.div_ceil(2) as f32 * spacing * side;
        [Vec2::new(0.0, step), Vec2::new(step, 0.0), Vec2::new(step, step)]
            .into_iter()
            .map(|offset| base + offset)
            .find(|p| self.grid.in_bounds(*p) && !self.grid.circle_blocked(*p, self.config.body.radius))
            .unwrap_or(base)
    }

    /// Advance the simulation by `dt` seconds (clamped to [0, MAX_DT])
    pub fn tick(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_DT) } else { 0.0 };
        self.clock.advance(dt as f64);
        let now = self.clock.now();

        self.rebuild_index();
        self.remove_dead(now);
        self.apply_leader_buff(dt);
        self.update_agents(now, dt);
        self.deliver_sounds(now);
        self.separate_agents();
        self.rebuild_index();
        self.advance_projectiles(now, dt);
        self.age_effects(now);
        self.run_elections(now);
        self.stats.ticks += 1;
    }

    fn lookup(&self) -> AHashMap<AgentId, usize> {
        self.agents
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id, i))
            .collect()
    }

    fn index_of(&self, id: AgentId) -> Option<usize> {
        self.agents.iter().position(|a| a.id == id)
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for agent in self.agents.iter().filter(|a| !a.state.dead) {
            self.index.insert(SpatialEntry {
                handle: SpatialHandle::Agent(agent.id),
                position: agent.position,
                radius: agent.radius,
            });
        }
        for cover in self.grid.covers() {
            self.index.insert(SpatialEntry {
                handle: SpatialHandle::Cover(cover.id),
                position: cover.center,
                radius: cover.radius,
            });
        }
    }

    /// Remove corpses and let the living react to each death
    fn remove_dead(&mut self, now: f64) {
        if !self.agents.iter().any(|a| a.state.dead) {
            return;
        }
        let (dead, alive): (Vec<Agent>, Vec<Agent>) = std::mem::take(&mut self.agents)
            .into_iter()
            .partition(|a| a.state.dead);
        self.agents = alive;
        for corpse in dead {
            self.handle_death(corpse, now);
        }
    }

    fn handle_death(&mut self, corpse: Agent, now: f64) {
        let was_leader =
            corpse.is_leader() || self.leader_of(corpse.team) == Some(corpse.id);
        info!(
            "{} ({:?}, team {}) died{}",
            corpse.id,
            corpse.role,
            corpse.team.0,
            if was_leader { ", squad leader lost" } else { "" }
        );
        self.stats.deaths += 1;
        self.events.emit(SimEvent::Death {
            id: corpse.id,
            team: corpse.team,
            position: corpse.position,
            was_leader,
        });

        let squad = &self.config.squad;
        let cooldown = self.config.decision.reaction_cooldown;
        let (stress, radius) = if was_leader {
            (squad.leader_death_stress, squad.leader_death_radius)
        } else {
            (squad.death_stress, squad.death_radius)
        };
        for agent in &mut self.agents {
            agent.memory.forget(corpse.id);
            if agent.team != corpse.team {
                agent.state.add_morale(squad.enemy_morale_boost);
                agent.state.add_approval(KILL_APPROVAL_GAIN);
                continue;
            }
            let distance = agent.position.distance(corpse.position);
            if distance <= radius {
                let falloff = 1.0 - distance / radius.max(1.0);
                agent.state.add_stress(stress * falloff);
                agent.state.add_morale(-squad.death_morale_penalty * falloff);
                agent.memory.record_death(corpse.position, DREAD_RADIUS, now);
                if !was_leader {
                    agent.state.add_approval(-DEATH_APPROVAL_LOSS);
                }
            }
            if was_leader {
                agent.react(now, cooldown);
            }
        }

        if was_leader {
            if let Some(squad) = self.squads.get_mut(corpse.team) {
                squad.leader_lost(now, &self.config.squad);
            }
        }
        if let Some(cache) = LootCache::from_fallen(LootId(self.next_loot_id), &corpse) {
            self.next_loot_id += 1;
            self.loot.push(cache);
        }
    }

    /// Followers near their leader calm down and take heart
    fn apply_leader_buff(&mut self, dt: f32) {
        let leaders: Vec<(TeamId, AgentId, Vec2)> = self
            .squads
            .iter()
            .filter_map(|squad| {
                let id = squad.leader?;
                self.agents
                    .iter()
                    .find(|a| a.id == id && a.is_active())
                    .map(|a| (squad.team, id, a.position))
            })
            .collect();

        let squad = &self.config.squad;
        for agent in &mut self.agents {
            agent.state.leader_buff = false;
            if !agent.is_active() {
                continue;
            }
            let Some(&(_, leader, at)) = leaders.iter().find(|(team, ..)| *team == agent.team) else {
                continue;
            };
            if leader == agent.id || agent.position.distance(at) > squad.leader_buff_radius {
                continue;
            }
            agent.state.leader_buff = true;
            agent.state.relieve_stress(squad.leader_stress_relief * dt);
            agent.state.add_morale(squad.leader_morale_gain * dt);
            agent.state.add_approval(LEADER_APPROVAL_GAIN * dt);
        }

        for squad in self.squads.iter_mut() {
            squad.observe_leader(&self.agents);
        }
    }

    fn update_agents(&mut self, now: f64, dt: f32) {
        let lookup = self.lookup();
        for i in 0..self.agents.len() {
            let mut outbox = Outbox::new();
            {
                let (before, rest) = self.agents.split_at_mut(i);
                let Some((me, after)) = rest.split_first_mut() else {
                    break;
                };
                let ctx = TickContext {
                    config: &self.config,
                    grid: &self.grid,
                    index: &self.index,
                    roster: Roster::new(before, after, &lookup, i),
                    loot: &self.loot,
                    squads: &self.squads,
                    now,
                    dt,
                };
                update_agent(me, &ctx, &mut self.rng, &mut outbox);
            }
            self.apply_effects(i, &mut outbox, now, dt);
        }
    }

    /// Apply what agent `actor` asked for during its update
    fn apply_effects(&mut self, actor: usize, outbox: &mut Outbox, now: f64, dt: f32) {
        let Some(agent) = self.agents.get(actor) else {
            return;
        };
        let (actor_id, team, position) = (agent.id, agent.team, agent.position);

        for effect in outbox.drain() {
            match effect {
                Effect::Spawn(projectile) => {
                    if projectile.kind == ProjectileKind::Bullet {
                        self.stats.shots += 1;
                    }
                    self.projectiles.push(projectile);
                }
                Effect::Event(event) => self.events.emit(event),
                Effect::ShareHeat => self.share_heat(actor),
                Effect::Heal { target } => {
                    let Some(i) = self.index_of(target) else {
                        continue;
                    };
                    let patient = &mut self.agents[i];
                    if patient.state.heal(&self.config.combat) {
                        info!("{} patched up {}", actor_id, target);
                        patient.memory.adjust_trust(
                            actor_id,
                            self.config.memory.trust_heal_gain,
                            &self.config.memory,
                        );
                    }
                }
                Effect::Resupply { target, rounds } => {
                    let Some(i) = self.index_of(target) else {
                        continue;
                    };
                    let mate = &mut self.agents[i];
                    mate.state.inventory.weapon.reserve += rounds;
                    mate.memory.adjust_trust(
                        actor_id,
                        self.config.memory.trust_resupply_gain,
                        &self.config.memory,
                    );
                    debug!("{} handed {} rounds to {}", actor_id, rounds, target);
                }
                Effect::TakeLoot { cache } => {
                    if let Some(stash) = self.loot.iter_mut().find(|c| c.id == cache) {
                        stash.transfer_to(&mut self.agents[actor]);
                        debug!("{} looted cache {}", actor_id, cache.0);
                    }
                }
                Effect::Trust { observer, delta } => {
                    if let Some(i) = self.index_of(observer) {
                        self.agents[i]
                            .memory
                            .adjust_trust(actor_id, delta, &self.config.memory);
                    }
                }
                Effect::Distress { kind, position: at } => {
                    self.broadcast_distress(actor_id, team, position, kind, at, now);
                }
                Effect::Mutiny { target } => self.resolve_mutiny(actor_id, target),
                Effect::Socialize { with } => {
                    if let Some(i) = self.index_of(with) {
                        self.agents[i]
                            .state
                            .add_social(self.config.body.social_gain * dt);
                    }
                }
            }
        }
    }

    /// Post a distress call to active teammates within sharing range of `from`
    fn broadcast_distress(
        &mut self,
        caller: AgentId,
        team: TeamId,
        from: Vec2,
        kind: DistressKind,
        at: Vec2,
        now: f64,
    ) {
        let radius = self.config.memory.share_radius;
        for mate in self.agents.iter_mut().filter(|a| {
            a.id != caller && a.team == team && a.is_active() && a.position.distance(from) <= radius
        }) {
            mate.memory.post_distress(caller, kind, at, now);
        }
    }

    /// Merge the sender's heat into teammates in range, weighted by trust
    fn share_heat(&mut self, sender: usize) {
        let Some(agent) = self.agents.get(sender) else {
            return;
        };
        let (id, team, position) = (agent.id, agent.team, agent.position);
        let heat = agent.memory.heat.clone();
        let memory = &self.config.memory;
        for (i, mate) in self.agents.iter_mut().enumerate() {
            if i == sender
                || mate.team != team
                || !mate.is_active()
                || mate.position.distance(position) > memory.share_radius
            {
                continue;
            }
            let trust = mate.memory.trust_of(id);
            mate.memory.heat.merge_from(&heat, trust, memory.min_share_trust);
        }
    }

    fn resolve_mutiny(&mut self, challenger: AgentId, leader: AgentId) {
        let (Some(ci), Some(li)) = (self.index_of(challenger), self.index_of(leader)) else {
            return;
        };
        let team = self.agents[ci].team;
        if self.leader_of(team) != Some(leader) || self.agents[li].team != team {
            return;
        }
        let succeeded = mutiny_succeeds(
            &self.agents[ci],
            &self.agents[li],
            &self.agents,
            &self.config.squad,
        );
        if succeeded {
            info!("{} overthrew {} as team {} leader", challenger, leader, team.0);
            self.agents[li].rank = 2;
            self.agents[ci].rank = 1;
            self.squads.ensure(team).leader = Some(challenger);
            for agent in self.agents.iter_mut().filter(|a| a.team == team) {
                agent.state.approval = FRESH_APPROVAL;
                agent.react(self.clock.now(), self.config.decision.reaction_cooldown);
            }
        } else {
            debug!("{} failed to unseat {}", challenger, leader);
            let challenger = &mut self.agents[ci];
            challenger.state.approval = FRESH_APPROVAL;
            challenger.state.add_stress(10.0);
        }
        self.events.emit(SimEvent::Mutiny {
            team,
            challenger,
            leader,
            succeeded,
        });
    }

    /// Deliver sounds emitted this tick to every listener except the source
    fn deliver_sounds(&mut self, now: f64) {
        let sounds = self.events.take_unheard();
        if sounds.is_empty() {
            return;
        }
        let teams: AHashMap<AgentId, TeamId> = self.agents.iter().map(|a| (a.id, a.team)).collect();
        for sound in sounds {
            let SimEvent::Sound {
                origin,
                radius,
                kind,
                source,
            } = sound
            else {
                continue;
            };
            let source_team = source.and_then(|id| teams.get(&id).copied());
            for agent in &mut self.agents {
                if source == Some(agent.id) {
                    continue;
                }
                let hostile = source_team.map_or(true, |t| t != agent.team);
                hear(agent, origin, radius, kind, hostile, now, &self.config);
            }
        }
    }

    /// Push overlapping bodies apart, never into walls. Indexes positions
    /// after this tick's movement.
    fn separate_agents(&mut self) {
        self.rebuild_index();
        let lookup = self.lookup();
        for i in 0..self.agents.len() {
            let (position, radius) = {
                let a = &self.agents[i];
                if !a.is_alive() {
                    continue;
                }
                (a.position, a.radius)
            };
            let candidates = self.index.agents_within(position, radius * 4.0);
            for id in candidates {
                let Some(&j) = lookup.get(&id) else {
                    continue;
                };
                if j <= i {
                    continue;
                }
                let (left, right) = self.agents.split_at_mut(j);
                let (a, b) = (&mut left[i], &mut right[0]);
                if !b.is_alive() {
                    continue;
                }
                let offset = b.position - a.position;
                let distance = offset.length();
                let min = a.radius + b.radius;
                if distance >= min {
                    continue;
                }
                let normal = if distance > 1e-4 { offset / distance } else { Vec2::X };
                let push = normal * (min - distance) * 0.5;
                let moved_a = a.position - push;
                if !self.grid.circle_blocked(moved_a, a.radius) {
                    a.position = moved_a;
                }
                let moved_b = b.position + push;
                if !self.grid.circle_blocked(moved_b, b.radius) {
                    b.position = moved_b;
                }
            }
        }
    }

    fn age_effects(&mut self, now: f64) {
        self.flashes.retain(|f| f.expires_at > now);
        self.grid.age_smoke(now);
        self.loot.retain(|c| !c.is_empty());
    }

    /// End expired chaos, demote invalid leaders and elect replacements
    fn run_elections(&mut self, now: f64) {
        for squad in self.squads.iter_mut() {
            let team = squad.team;
            if squad.chaos_until.is_some_and(|until| now >= until) {
                squad.chaos_until = None;
            }
            if !squad.in_chaos(now) {
                let valid = squad
                    .leader
                    .is_some_and(|id| self.agents.iter().any(|a| a.id == id && a.is_active()));
                if !valid {
                    for agent in self.agents.iter_mut().filter(|a| a.team == team && a.rank == 1) {
                        agent.rank = 2;
                    }
                    squad.leader = elect(&self.agents, team, &self.config.squad);
                    if let Some(leader) = squad.leader {
                        if let Some(agent) = self.agents.iter_mut().find(|a| a.id == leader) {
                            agent.rank = 1;
                        }
                        for agent in self.agents.iter_mut().filter(|a| a.team == team) {
                            agent.state.approval = agent.state.approval.max(FRESH_APPROVAL);
                        }
                        info!("{} now leads team {}", leader, team.0);
                        self.events.emit(SimEvent::LeaderElected { team, leader });
                    }
                }
            }
            squad.observe_leader(&self.agents);
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;

    fn open_world() -> World {
        let config = SimConfig::default();
        let grid = WorldGrid::new(100, 100, config.world.tile_size, config.world.los_step);
        let map = LoadedMap {
            grid,
            spawns: SpawnPoints::default(),
        };
        World::with_seed(config, map, 7).with_clock(ManualClock::new())
    }

    #[test]
    fn test_tick_clamps_dt_and_advances_clock() {
        let mut world = open_world();
        world.tick(10.0);
        assert!((world.now() - MAX_DT as f64).abs() < 1e-9);
        world.tick(f32::NAN);
        assert!((world.now() - MAX_DT as f64).abs() < 1e-9);
        world.tick(-1.0);
        assert_eq!(world.stats().ticks, 3);
    }

    #[test]
    fn test_spawn_squads_elects_one_leader_per_team() {
        let mut world = open_world();
        world.spawn_squads(4);
        assert_eq!(world.agents().len(), 8);
        for team in TEAMS {
            let leaders: Vec<_> = world
                .agents()
                .iter()
                .filter(|a| a.team == team && a.rank == 1)
                .collect();
            assert_eq!(leaders.len(), 1);
            assert_eq!(world.leader_of(team), Some(leaders[0].id));
        }
        let events = world.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, SimEvent::LeaderElected { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_extra_team_gets_its_own_squad() {
        let mut world = open_world();
        world.spawn_squads(2);
        let team_one = world.leader_of(TeamId(1));
        assert!(team_one.is_some());

        let stray = world.spawn_agent(TeamId(2), Role::Rifleman, Vec2::new(200.0, 380.0));
        world.tick(0.05);
        assert_eq!(world.leader_of(TeamId(2)), Some(stray));
        assert_eq!(world.leader_of(TeamId(1)), team_one);
        assert!(world.squad(TeamId(3)).is_none());
    }

    #[test]
    fn test_dead_agent_is_removed_and_drops_loot() {
        let mut world = open_world();
        let victim = world.spawn_agent(TeamId(0), Role::Rifleman, Vec2::new(100.0, 100.0));
        world.spawn_agent(TeamId(0), Role::Rifleman, Vec2::new(120.0, 100.0));
        if let Some(agent) = world.agent_mut(victim) {
            agent.state.dead = true;
        }
        world.tick(0.05);
        assert!(world.agent(victim).is_none());
        assert_eq!(world.stats().deaths, 1);
        assert_eq!(world.loot().len(), 1);
        let deaths = world
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SimEvent::Death { id, .. } if *id == victim))
            .count();
        assert_eq!(deaths, 1);
    }

    #[test]
    fn test_overlapping_agents_are_pushed_apart() {
        let mut world = open_world();
        world.spawn_agent(TeamId(0), Role::Rifleman, Vec2::new(100.0, 100.0));
        world.spawn_agent(TeamId(0), Role::Rifleman, Vec2::new(101.0, 100.0));
        world.rebuild_index();
        world.separate_agents();
        let a = world.agents()[0].position;
        let b = world.agents()[1].position;
        assert!(a.distance(b) > 1.0);
    }

    #[test]
    fn test_separation_sees_movement_since_last_index() {
        let mut world = open_world();
        world.spawn_agent(TeamId(0), Role::Rifleman, Vec2::new(100.0, 100.0));
        let runner = world.spawn_agent(TeamId(0), Role::Rifleman, Vec2::new(300.0, 100.0));
        world.rebuild_index();
        if let Some(agent) = world.agent_mut(runner) {
            agent.position = Vec2::new(101.0, 100.0);
        }
        world.separate_agents();
        let a = &world.agents()[0];
        let b = &world.agents()[1];
        assert!(a.position.distance(b.position) >= a.radius + b.radius - 1e-3);
    }
}
