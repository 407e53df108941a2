//! Tribal Emergence - tactical multi-agent squad simulation core
//!
//! Two teams of agents perceive, remember, decide and fight on a tile map.
//! Rendering, input and audio live elsewhere; they read `World` snapshots
//! and drain its events.

pub mod agent;
pub mod core;
pub mod decision;
pub mod map;
pub mod pathfinding;
pub mod perception;
pub mod simulation;
pub mod spatial;
