//! Tile world: occupancy, destructible cover, sight and map loading

pub mod loader;
pub mod tiles;
pub mod world_grid;

pub use loader::{load_or_generate, LoadedMap, MapDescription, SpawnPoints};
pub use tiles::{Cover, SmokeCloud, TileKind};
pub use world_grid::{CoverDestroyed, WorldGrid};
