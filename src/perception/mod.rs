//! Perception and belief
//!
//! Detection meters, the per-agent memory store and the sensing pass that
//! feeds one from the other.

pub mod detection;
pub mod memory;
pub mod sensing;

pub use detection::{angular_factor, detection_rate, step_meter, DetectionInput};
pub use memory::{DistressKind, DistressSignal, HeatGrid, HostileSighting, Memory, Zone};
pub use sensing::{hear, perceive};
