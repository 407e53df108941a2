//! Headless skirmish runner
//!
//! Loads a map and tuning file, spawns two squads and runs them against each
//! other, printing a summary as text or JSON.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use tribal_emergence::core::clock::ManualClock;
use tribal_emergence::core::config::SimConfig;
use tribal_emergence::core::error::Result;
use tribal_emergence::core::types::TeamId;
use tribal_emergence::map::load_or_generate;
use tribal_emergence::simulation::{AgentSnapshot, SimEvent, World, WorldStats};

/// Run two AI squads against each other without a renderer
#[derive(Parser, Debug)]
#[command(name = "tribal-emergence")]
#[command(about = "Run a headless squad skirmish and report what happened")]
struct Args {
    /// Map description (JSON). A procedural map is used when absent or unusable
    #[arg(long)]
    map: Option<PathBuf>,

    /// Tuning file (TOML). Defaults apply when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum ticks to run
    #[arg(long, default_value_t = 6000)]
    ticks: u64,

    /// Seconds per tick
    #[arg(long, default_value_t = 0.05)]
    dt: f32,

    /// Agents per team
    #[arg(long, default_value_t = 6)]
    per_team: usize,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,

    /// Drive the simulation from wall time, sleeping between ticks
    #[arg(long)]
    realtime: bool,

    /// Include final agent snapshots in the output
    #[arg(long)]
    snapshots: bool,
}

#[derive(Serialize)]
struct RunSummary {
    outcome: &'static str,
    seed: u64,
    ticks: u64,
    sim_seconds: f64,
    survivors: [usize; 2],
    leaders: [Option<u32>; 2],
    first_contacts: usize,
    elections: usize,
    mutinies: usize,
    stats: WorldStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshots: Option<Vec<AgentSnapshot>>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tribal_emergence=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut map_rng = ChaCha8Rng::seed_from_u64(seed);
    let (description, map_error) = load_or_generate(args.map.as_deref(), &config.world, &mut map_rng);
    if let Some(e) = map_error {
        tracing::warn!("Map fallback in effect: {}", e);
    }

    let mut world = World::from_map(config, &description, Some(seed))?;
    if !args.realtime {
        world = world.with_clock(ManualClock::new());
    }
    world.spawn_squads(args.per_team);
    tracing::info!("Skirmish starting with seed {}", seed);

    let mut first_contacts = 0;
    let mut elections = 0;
    let mut mutinies = 0;
    for _ in 0..args.ticks {
        world.tick(args.dt);
        for event in world.drain_events() {
            match event {
                SimEvent::FirstContact { .. } => first_contacts += 1,
                SimEvent::LeaderElected { .. } => elections += 1,
                SimEvent::Mutiny { .. } => mutinies += 1,
                _ => {}
            }
        }
        if world.survivors(TeamId(0)) == 0 || world.survivors(TeamId(1)) == 0 {
            break;
        }
        if args.realtime {
            std::thread::sleep(Duration::from_secs_f32(args.dt.max(0.0)));
        }
    }

    let survivors = [world.survivors(TeamId(0)), world.survivors(TeamId(1))];
    let outcome = match survivors {
        [0, 0] => "mutual_destruction",
        [_, 0] => "team_a_victory",
        [0, _] => "team_b_victory",
        _ => "timeout",
    };
    let summary = RunSummary {
        outcome,
        seed,
        ticks: world.stats().ticks,
        sim_seconds: world.now(),
        survivors,
        leaders: [
            world.leader_of(TeamId(0)).map(|id| id.0),
            world.leader_of(TeamId(1)).map(|id| id.0),
        ],
        first_contacts,
        elections,
        mutinies,
        stats: world.stats(),
        snapshots: args.snapshots.then(|| world.snapshots()),
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("=== Skirmish Result ===");
        println!("Outcome: {}", summary.outcome);
        println!("Seed: {}", summary.seed);
        println!("Ticks: {} ({:.1}s simulated)", summary.ticks, summary.sim_seconds);
        println!("Survivors: A={} B={}", survivors[0], survivors[1]);
        println!(
            "Shots: {}  Hits: {}  Downed: {}  Deaths: {}",
            summary.stats.shots, summary.stats.hits, summary.stats.downed, summary.stats.deaths
        );
        println!(
            "Explosions: {}  Covers destroyed: {}",
            summary.stats.explosions, summary.stats.covers_destroyed
        );
        println!(
            "First contacts: {}  Elections: {}  Mutinies: {}",
            first_contacts, elections, mutinies
        );
        for agent in summary.snapshots.iter().flatten() {
            println!(
                "  {} team {} {:?}{} hp {:.0}/{:.0} stress {:.0} ammo {}+{} {} {:?}",
                agent.id,
                agent.team.0,
                agent.role,
                if agent.is_leader { " (leader)" } else { "" },
                agent.hp,
                agent.max_hp,
                agent.stress,
                agent.ammo,
                agent.reserve,
                agent.action,
                agent.mode,
            );
        }
    }
    Ok(())
}
