use terrain_tiles_core::{exact_square_side, Extent};

use itertools::iproduct;
use std::sync::Arc;

/// A grid shared between the cache, pending queries and the segments it was applied to.
pub type SharedGrid = Arc<ElevationGrid>;

/// A square, row-major grid of heights in meters.
///
/// A grid of `grid_size` cells per side has `(grid_size + 1)²` vertices. Row `0` is the northern edge and column `0` is the
/// western edge of the grid's extent.
#[derive(Clone, Debug, PartialEq)]
pub struct ElevationGrid {
    side: usize,
    heights: Vec<f32>,
}

/// One of the four border lines of a grid.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Border {
    North,
    South,
    West,
    East,
}

impl ElevationGrid {
    /// Wraps `heights`, which must hold a square number of vertices. Returns `None` otherwise.
    pub fn from_heights(heights: Vec<f32>) -> Option<Self> {
        let side = exact_square_side(heights.len())?;
        if side == 0 {
            return None;
        }
        Some(Self { side, heights })
    }

    /// A grid with `grid_size` cells per side where every vertex has `height`.
    pub fn filled(grid_size: usize, height: f32) -> Self {
        let side = grid_size + 1;
        Self {
            side,
            heights: vec![height; side * side],
        }
    }

    /// Builds a grid by evaluating `f(row, col)` at every vertex.
    pub fn from_fn(grid_size: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let side = grid_size + 1;
        // Rows vary slowest, which is row-major order.
        let heights = iproduct!(0..side, 0..side)
            .map(|(row, col)| f(row, col))
            .collect();

        Self { side, heights }
    }

    /// Number of vertices per row (and per column).
    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    /// Number of cells per row (and per column).
    #[inline]
    pub fn grid_size(&self) -> usize {
        self.side - 1
    }

    #[inline]
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    #[inline]
    pub fn into_heights(self) -> Vec<f32> {
        self.heights
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.heights[row * self.side + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, height: f32) {
        self.heights[row * self.side + col] = height;
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.side;
        &self.heights[start..start + self.side]
    }

    pub fn column(&self, col: usize) -> Vec<f32> {
        (0..self.side).map(|row| self.get(row, col)).collect()
    }

    /// The vertices along `border`, west-to-east for rows and north-to-south for columns.
    pub fn border(&self, border: Border) -> Vec<f32> {
        let last = self.side - 1;
        match border {
            Border::North => self.row(0).to_vec(),
            Border::South => self.row(last).to_vec(),
            Border::West => self.column(0),
            Border::East => self.column(last),
        }
    }

    /// Bilinear sample at fractional vertex coordinates. Coordinates are clamped into the grid.
    pub fn sample_bilinear(&self, row: f64, col: f64) -> f32 {
        let last = (self.side - 1) as f64;
        let row = row.max(0.0).min(last);
        let col = col.max(0.0).min(last);

        let r0 = row.floor() as usize;
        let c0 = col.floor() as usize;
        let r1 = (r0 + 1).min(self.side - 1);
        let c1 = (c0 + 1).min(self.side - 1);
        let fr = (row - r0 as f64) as f32;
        let fc = (col - c0 as f64) as f32;

        let north = self.get(r0, c0) * (1.0 - fc) + self.get(r0, c1) * fc;
        let south = self.get(r1, c0) * (1.0 - fc) + self.get(r1, c1) * fc;
        north * (1.0 - fr) + south * fr
    }

    /// Size of the grid's height buffer in bytes.
    #[inline]
    pub fn memory_bytes(&self) -> usize {
        self.heights.len() * std::mem::size_of::<f32>()
    }
}

/// A decoded tile ready to be handed to a segment, together with the bounds it covers.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    pub grid: SharedGrid,
    pub extent: Extent,
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
