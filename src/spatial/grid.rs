//! Dense 2D grid for per-cell simulation data

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;

/// Dense 2D grid with a fixed cell size, origin at (0, 0)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid<T: Clone + Default> {
    pub width: usize,
    pub height: usize,
    pub cell_size: f32,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: usize, height: usize, cell_size: f32) -> Self {
        Self {
            width,
            height,
            cell_size,
            data: vec![T::default(); width * height],
        }
    }

    /// Grid covering a world rectangle of the given size
    pub fn covering(world_width: f32, world_height: f32, cell_size: f32) -> Self {
        let width = (world_width / cell_size).ceil().max(1.0) as usize;
        let height = (world_height / cell_size).ceil().max(1.0) as usize;
        Self::new(width, height, cell_size)
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<&T> {
        if self.in_bounds(x, y) {
            Some(&self.data[y as usize * self.width + x as usize])
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut T> {
        if self.in_bounds(x, y) {
            Some(&mut self.data[y as usize * self.width + x as usize])
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: T) {
        if let Some(cell) = self.get_mut(x, y) {
            *cell = value;
        }
    }

    /// Cell coordinates of a world position (may be out of bounds)
    #[inline]
    pub fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Cell coordinates clamped into the grid
    #[inline]
    pub fn clamped_cell_of(&self, pos: Vec2) -> (i32, i32) {
        let (x, y) = self.cell_of(pos);
        (
            x.clamp(0, self.width as i32 - 1),
            y.clamp(0, self.height as i32 - 1),
        )
    }

    /// Sample grid at world position
    pub fn sample(&self, pos: Vec2) -> Option<&T> {
        let (x, y) = self.cell_of(pos);
        self.get(x, y)
    }

    /// Cell center in world coordinates
    pub fn cell_center(&self, x: i32, y: i32) -> Vec2 {
        Vec2::new(
            (x as f32 + 0.5) * self.cell_size,
            (y as f32 + 0.5) * self.cell_size,
        )
    }

    /// World-space size of the whole grid
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.cell_size,
            self.height as f32 * self.cell_size,
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.data.iter_mut()
    }

    /// Iterate (x, y, value) for every cell
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32, &T)> {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, v)| ((i % width) as i32, (i / width) as i32, v))
    }
}
