pub mod grid;
pub mod index;

pub use grid::Grid;
pub use index::{SpatialEntry, SpatialHandle, SpatialIndex};
