//! Simulation - the per-tick orchestration of agents, projectiles and squads
//!
//! `World` owns everything. Each agent is updated with mutable access to
//! itself and a read-only view of everyone else; cross-agent changes flow
//! through an `Outbox` of effects.

pub mod context;
pub mod events;
pub mod loot;
pub mod projectile;
pub mod snapshot;
pub mod squad;
pub mod update;
pub mod world;

pub use context::{Effect, Outbox, Roster, TickContext};
pub use events::{EventBus, SimEvent, SoundKind};
pub use loot::LootCache;
pub use projectile::{Projectile, ProjectileKind, ProjectileOutcome};
pub use snapshot::{AgentSnapshot, FlashEffect, FlashKind, ProjectileSnapshot, WorldStats};
pub use squad::{elect, election_score, mutiny_succeeds, SquadBoard, SquadState};
pub use update::update_agent;
pub use world::{World, MAX_DT};
