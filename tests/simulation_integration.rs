//! Whole-world scenarios: contact, fire discipline, casualties and succession

use proptest::prelude::*;

use tribal_emergence::agent::{DamageOutcome, FireMode, FireOutcome, MORALE_MAX, STRESS_MAX, SUPPRESSION_MAX};
use tribal_emergence::core::clock::ManualClock;
use tribal_emergence::core::config::{PathfindingConfig, SimConfig};
use tribal_emergence::core::types::{Role, TeamId, Vec2};
use tribal_emergence::map::{LoadedMap, MapDescription, SpawnPoints, TileKind, WorldGrid};
use tribal_emergence::pathfinding::{find_path, PathRequest};
use tribal_emergence::simulation::{SimEvent, World};

const DT: f32 = 0.05;

/// 800 x 480 open field on a manual clock
fn open_world(seed: u64) -> World {
    let config = SimConfig::default();
    let grid = WorldGrid::new(200, 120, config.world.tile_size, config.world.los_step);
    let map = LoadedMap {
        grid,
        spawns: SpawnPoints::default(),
    };
    World::with_seed(config, map, seed).with_clock(ManualClock::new())
}

fn run(world: &mut World, ticks: usize) -> Vec<SimEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        world.tick(DT);
        events.extend(world.drain_events());
    }
    events
}

#[test]
fn test_opposing_riflemen_make_contact_and_fire() {
    let mut world = open_world(11);
    world.spawn_agent(TeamId(0), Role::Rifleman, Vec2::new(300.0, 240.0));
    world.spawn_agent(TeamId(1), Role::Rifleman, Vec2::new(500.0, 240.0));

    let events = run(&mut world, 400);
    assert!(events
        .iter()
        .any(|e| matches!(e, SimEvent::FirstContact { .. })));
    assert!(world.stats().shots > 0);
    assert!(events
        .iter()
        .any(|e| matches!(e, SimEvent::Sound { .. })));
}

#[test]
fn test_friendly_in_line_blocks_direct_fire() {
    let mut world = open_world(12);
    let shooter = world.spawn_agent(TeamId(0), Role::Rifleman, Vec2::new(100.0, 240.0));
    let friend = world.spawn_agent(TeamId(0), Role::Rifleman, Vec2::new(160.0, 240.0));
    let enemy = world.spawn_agent(TeamId(1), Role::Rifleman, Vec2::new(320.0, 240.0));

    let outcome = world.fire_at(shooter, enemy, FireMode::Attack);
    assert_eq!(outcome, Some(FireOutcome::FriendlyInLine));
    assert_eq!(world.stats().shots, 0);

    // Step the friend out of the line and try again
    if let Some(agent) = world.agent_mut(friend) {
        agent.position = Vec2::new(160.0, 320.0);
    }
    let outcome = world.fire_at(shooter, enemy, FireMode::Attack);
    assert_eq!(outcome, Some(FireOutcome::Fired));
    assert_eq!(world.stats().shots, 1);
    assert_eq!(world.projectiles().len(), 1);
}

#[test]
fn test_downed_agent_bleeds_out_and_dies_once() {
    let mut world = open_world(13);
    let victim = world.spawn_agent(TeamId(0), Role::Rifleman, Vec2::new(200.0, 200.0));
    world.spawn_agent(TeamId(1), Role::Rifleman, Vec2::new(780.0, 460.0));

    let outcome = world.apply_damage(victim, 500.0, Vec2::new(150.0, 200.0));
    assert_eq!(outcome, DamageOutcome::Downed);
    assert!(world.agent(victim).is_some_and(|a| a.state.downed && !a.state.dead));
    assert_eq!(world.survivors(TeamId(0)), 0);
    let downed = world.drain_events();
    assert!(downed
        .iter()
        .any(|e| matches!(e, SimEvent::Downed { id, .. } if *id == victim)));

    let events = run(&mut world, 400);
    let deaths = events
        .iter()
        .filter(|e| matches!(e, SimEvent::Death { id, .. } if *id == victim))
        .count();
    assert_eq!(deaths, 1);
    assert!(world.agent(victim).is_none());
    assert_eq!(world.stats().deaths, 1);
    assert_eq!(
        world.apply_damage(victim, 10.0, Vec2::ZERO),
        DamageOutcome::Ignored
    );
}

#[test]
fn test_leader_death_opens_chaos_then_elects_successor() {
    let mut world = open_world(14);
    world.spawn_squads(4);
    let old = world.leader_of(TeamId(0)).expect("initial leader");
    world.drain_events();

    if let Some(agent) = world.agent_mut(old) {
        agent.state.dead = true;
    }
    let events = run(&mut world, 1);
    assert!(events.iter().any(|e| matches!(
        e,
        SimEvent::Death { id, was_leader: true, .. } if *id == old
    )));
    assert_eq!(world.leader_of(TeamId(0)), None);
    assert!(world
        .squad(TeamId(0))
        .is_some_and(|squad| squad.in_chaos(world.now())));

    let chaos = world.config().squad.chaos_duration;
    let events = run(&mut world, (chaos / DT as f64) as usize + 2);
    let successor = world.leader_of(TeamId(0)).expect("successor");
    assert_ne!(successor, old);
    assert!(events.iter().any(|e| matches!(
        e,
        SimEvent::LeaderElected { team: TeamId(0), leader } if *leader == successor
    )));
    let ranked: Vec<_> = world
        .agents()
        .iter()
        .filter(|a| a.team == TeamId(0) && a.is_active() && a.rank == 1)
        .map(|a| a.id)
        .collect();
    assert_eq!(ranked, vec![successor]);
}

#[test]
fn test_world_builds_from_bundled_map() {
    let json = include_str!("../data/maps/outpost.json");
    let description = MapDescription::from_json(json).expect("bundled map parses");
    let mut world = World::from_map(SimConfig::default(), &description, Some(3))
        .expect("bundled map is valid")
        .with_clock(ManualClock::new());
    world.spawn_squads(3);
    assert_eq!(world.agents().len(), 6);
    for agent in world.agents() {
        assert!(!world.grid().circle_blocked(agent.position, agent.radius));
    }
    run(&mut world, 20);
    assert_eq!(world.stats().ticks, 20);
}

#[test]
fn test_world_refuses_degenerate_heat_grid() {
    let description = MapDescription::from_json(include_str!("../data/maps/outpost.json"))
        .expect("bundled map parses");
    let mut config = SimConfig::default();
    config.memory.heat_cell_size = 0.0;
    assert!(World::from_map(config, &description, Some(5)).is_err());
}

#[test]
fn test_path_waypoints_avoid_walls() {
    let mut grid = WorldGrid::new(120, 80, 4.0, 2.0);
    // Vertical wall with a gap near the bottom
    for y in 0..64 {
        grid.paint(60, y, TileKind::Wall);
    }
    let start = Vec2::new(40.0, 40.0);
    let goal = Vec2::new(440.0, 40.0);
    let request = PathRequest {
        start,
        goal,
        radius: 6.0,
        prefers_stealth: false,
        heat: None,
    };
    let path = find_path(&grid, &request, &PathfindingConfig::default());
    assert!(!path.is_empty());
    assert_eq!(path.last().copied(), Some(goal));
    for waypoint in &path {
        assert!(!grid.is_blocked_for_movement(*waypoint));
    }
    // The detour has to pass below the wall
    assert!(path.iter().any(|w| w.y > 256.0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_ticks_keep_state_in_bounds(seed in 0u64..1_000, dt in -0.5f32..1.0) {
        let mut world = open_world(seed);
        world.spawn_squads(3);
        for _ in 0..30 {
            world.tick(dt);
        }
        let size = world.grid().size();
        for agent in world.agents() {
            let s = &agent.state;
            prop_assert!(agent.position.is_finite());
            prop_assert!(agent.position.x >= 0.0 && agent.position.x <= size.x);
            prop_assert!(agent.position.y >= 0.0 && agent.position.y <= size.y);
            prop_assert!(s.hp >= 0.0 && s.hp <= s.max_hp);
            prop_assert!(s.stress >= 0.0 && s.stress <= STRESS_MAX);
            prop_assert!(s.suppression >= 0.0 && s.suppression <= SUPPRESSION_MAX);
            prop_assert!(s.morale >= 0.0 && s.morale <= MORALE_MAX);
            prop_assert!(s.stamina >= 0.0 && s.stamina <= s.stamina_max);
        }
        prop_assert!(world.now() <= 30.0 * tribal_emergence::simulation::MAX_DT as f64 + 1e-6);
    }

    #[test]
    fn prop_line_of_sight_is_symmetric(
        walls in proptest::collection::vec((0i32..50, 0i32..50), 0..120),
        ax in 2.0f32..198.0, ay in 2.0f32..198.0,
        bx in 2.0f32..198.0, by in 2.0f32..198.0,
    ) {
        let mut grid = WorldGrid::new(50, 50, 4.0, 2.0);
        for (x, y) in walls {
            grid.paint(x, y, TileKind::Wall);
        }
        let a = Vec2::new(ax, ay);
        let b = Vec2::new(bx, by);
        prop_assert_eq!(
            grid.has_line_of_sight(a, b, 400.0, true),
            grid.has_line_of_sight(b, a, 400.0, true)
        );
    }
}
