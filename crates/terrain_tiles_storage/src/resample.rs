//! Converts a decoded raster into the vertex grid of its tile, and optionally into the grids of the tile's four children.
//!
//! # Stitching
//!
//! When the raster has exactly twice as many pixels per side as the destination grid has cells (`S == 2D`), the raster is
//! treated as the interior vertices of a "virtual" grid with `2D + 1` vertices per side. The virtual row and column at
//! index `D` do not exist in the raster; they are synthesized as the mean of the two pixels on either side (and the mean of
//! four pixels at the center). Then:
//!
//! - child `(qx, qy)` is the `(D + 1)²` window of the virtual grid starting at `(qy * D, qx * D)`
//! - the current tile is every other vertex of the virtual grid
//!
//! Every vertex on a border shared by two children, or by a child and the current tile, comes from the same computed
//! value, so adjacent grids agree bit-for-bit.
//!
//! # Other shapes
//!
//! - `S > 2D`, both powers of two: blocks of `S / 2D` pixels are averaged first, skipping no-data, then stitched.
//! - `S == D`: one vertex per pixel, the last row and column are repeated for the far border.
//! - `S < D`: like `S == D`, but the grid only has `S` cells per side.
//! - `S` not a power of two: the raster is copied 1:1 and no children are produced.

use crate::{DecodedRaster, ElevationGrid, NoDataRule, ParentFallback};

use terrain_tiles_core::is_power_of_two;

/// How a raster was mapped onto the destination grid.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RasterShape {
    /// `S == 2D`.
    Stitched,
    /// `S > 2D`, averaged in blocks of `block × block` pixels, then stitched.
    Reduced { block: usize },
    /// `S == D`.
    Direct,
    /// `S < D`.
    Undersampled,
    /// `S` is not a power of two.
    Raw,
}

impl RasterShape {
    pub fn classify(source_side: usize, dest_size: usize) -> Self {
        if !is_power_of_two(source_side) {
            RasterShape::Raw
        } else if source_side == 2 * dest_size {
            RasterShape::Stitched
        } else if source_side > 2 * dest_size {
            RasterShape::Reduced {
                block: source_side / (2 * dest_size),
            }
        } else if source_side == dest_size {
            RasterShape::Direct
        } else if source_side < dest_size {
            RasterShape::Undersampled
        } else {
            // D < S < 2D cannot happen for powers of two, but a non-power-of-two destination can land here.
            RasterShape::Reduced { block: 1 }
        }
    }

    /// Only the stitching shapes can seed children.
    #[inline]
    pub fn can_seed_children(&self) -> bool {
        matches!(self, RasterShape::Stitched | RasterShape::Reduced { .. })
    }
}

/// The outcome of resampling one raster.
#[derive(Clone, Debug, PartialEq)]
pub struct Resampled {
    pub current: ElevationGrid,
    /// Children in `TileKey::children` order: north-west, north-east, south-west, south-east.
    pub children: Option<[ElevationGrid; 4]>,
    pub shape: RasterShape,
}

/// Resamples `raster` into a grid of `dest_size` cells per side.
///
/// Heights flagged by `no_data`, and heights exactly equal to zero, are replaced by `fallback` samples when a fallback is
/// given. Flagged heights that cannot be replaced end up as `0.0`. Children are produced only when `seed_children` is set and
/// the shape allows it.
pub fn resample(
    raster: &DecodedRaster,
    dest_size: usize,
    no_data: &NoDataRule,
    fallback: Option<&ParentFallback>,
    seed_children: bool,
) -> Resampled {
    let dest_size = dest_size.max(1);
    let source_side = raster.side();
    let shape = RasterShape::classify(source_side, dest_size);

    match shape {
        RasterShape::Raw => Resampled {
            current: raw_grid(raster),
            children: None,
            shape,
        },
        RasterShape::Stitched => {
            let sampler = Sampler::new(raster.heights(), source_side, no_data, fallback);
            let (current, children) = stitch(&sampler, dest_size, seed_children);
            Resampled {
                current,
                children,
                shape,
            }
        }
        RasterShape::Reduced { block } => {
            let reduced = reduce_blocks(raster.heights(), source_side, block, no_data);
            let reduced_side = source_side / block;
            let sampler = Sampler::new(&reduced, reduced_side, no_data, fallback);
            let (current, children) = if reduced_side == 2 * dest_size {
                stitch(&sampler, dest_size, seed_children)
            } else {
                (direct(&sampler, reduced_side.min(dest_size)), None)
            };
            Resampled {
                current,
                children,
                shape,
            }
        }
        RasterShape::Direct | RasterShape::Undersampled => {
            let sampler = Sampler::new(raster.heights(), source_side, no_data, fallback);
            Resampled {
                current: direct(&sampler, source_side),
                children: None,
                shape,
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Sample {
    height: f32,
    valid: bool,
}

impl Sample {
    #[inline]
    fn resolve(self) -> f32 {
        if self.valid {
            self.height
        } else {
            0.0
        }
    }
}

/// Mean of `here` and the valid samples in `others`. An invalid `here` is returned unchanged.
#[inline]
fn blend(here: Sample, others: &[Sample]) -> Sample {
    if !here.valid {
        return here;
    }
    let mut sum = here.height;
    let mut count = 1u32;
    for other in others.iter().filter(|s| s.valid) {
        sum += other.height;
        count += 1;
    }

    Sample {
        height: sum / count as f32,
        valid: true,
    }
}

struct Sampler<'a> {
    heights: &'a [f32],
    side: usize,
    no_data: &'a NoDataRule,
    fallback: Option<&'a ParentFallback>,
}

impl<'a> Sampler<'a> {
    fn new(
        heights: &'a [f32],
        side: usize,
        no_data: &'a NoDataRule,
        fallback: Option<&'a ParentFallback>,
    ) -> Self {
        Self {
            heights,
            side,
            no_data,
            fallback,
        }
    }

    /// The pixel at `(row, col)`, whose vertex sits at `(u, v)` of the current tile.
    #[inline]
    fn sample(&self, row: usize, col: usize, u: f64, v: f64) -> Sample {
        let height = self.heights[row * self.side + col];
        let no_data = self.no_data.is_no_data(height);
        if no_data || height == 0.0 {
            if let Some(fallback) = self.fallback {
                return Sample {
                    height: fallback.height_at(u, v),
                    valid: true,
                };
            }
        }

        Sample {
            height,
            valid: !no_data,
        }
    }
}

fn raw_grid(raster: &DecodedRaster) -> ElevationGrid {
    let cells = raster.side() - 1;
    ElevationGrid::from_fn(cells, |row, col| raster.get(row, col))
}

/// One vertex per pixel for a grid of `cells` cells, repeating the last pixel row and column on the far border.
fn direct(sampler: &Sampler, cells: usize) -> ElevationGrid {
    let last = sampler.side - 1;
    let scale = 1.0 / cells as f64;
    ElevationGrid::from_fn(cells, |row, col| {
        let u = col as f64 * scale;
        let v = row as f64 * scale;
        sampler
            .sample(row.min(last), col.min(last), u, v)
            .resolve()
    })
}

/// Averages `block × block` pixel blocks, skipping no-data. A block without valid pixels keeps its first pixel.
fn reduce_blocks(heights: &[f32], side: usize, block: usize, no_data: &NoDataRule) -> Vec<f32> {
    if block <= 1 {
        return heights.to_vec();
    }

    let reduced_side = side / block;
    let mut reduced = Vec::with_capacity(reduced_side * reduced_side);
    for block_row in 0..reduced_side {
        for block_col in 0..reduced_side {
            let first_row = block_row * block;
            let first_col = block_col * block;
            let mut sum = 0.0f64;
            let mut count = 0u32;
            for row in first_row..first_row + block {
                for &h in &heights[row * side + first_col..row * side + first_col + block] {
                    if !no_data.is_no_data(h) {
                        sum += f64::from(h);
                        count += 1;
                    }
                }
            }
            reduced.push(if count > 0 {
                (sum / f64::from(count)) as f32
            } else {
                heights[first_row * side + first_col]
            });
        }
    }

    reduced
}

#[inline]
fn is_even(n: usize) -> bool {
    n % 2 == 0
}

/// Single pass over a `2D × 2D` raster that writes the current grid and, optionally, the four child grids.
fn stitch(
    sampler: &Sampler,
    dest_size: usize,
    seed_children: bool,
) -> (ElevationGrid, Option<[ElevationGrid; 4]>) {
    let source_side = sampler.side;
    debug_assert_eq!(source_side, 2 * dest_size);

    let d = dest_size;
    let side = d + 1;
    let last = source_side - 1;
    let virtual_cells = (2 * d) as f64;

    // Tile-normalized position of a pixel's vertex in the virtual grid.
    let uv = |row: usize, col: usize| {
        (
            (col + col / d) as f64 / virtual_cells,
            (row + row / d) as f64 / virtual_cells,
        )
    };
    let sample = |row: usize, col: usize| {
        let (u, v) = uv(row, col);
        sampler.sample(row, col, u, v)
    };

    let mut current = Vec::with_capacity(side * side);
    let mut children = if seed_children {
        Some([
            vec![0.0; side * side],
            vec![0.0; side * side],
            vec![0.0; side * side],
            vec![0.0; side * side],
        ])
    } else {
        None
    };

    for i in 0..source_side {
        for j in 0..source_side {
            let tile_x = j / d;
            let tile_y = i / d;
            let ii = i % d;
            let jj = j % d;
            let q = tile_y * 2 + tile_x;

            // Position of this pixel in the virtual grid.
            let vr = i + tile_y;
            let vc = j + tile_x;

            let here = sample(i, j);
            let height = here.resolve();
            if let Some(c) = children.as_mut() {
                c[q][(ii + tile_y) * side + jj + tile_x] = height;
            }
            if is_even(vr) && is_even(vc) {
                current.push(height);
            }

            let right = if jj == d - 1 && j != last {
                let right = sample(i, j + 1);
                let mid = blend(here, &[right]).resolve();
                if let Some(c) = children.as_mut() {
                    c[q][(ii + tile_y) * side + d] = mid;
                    c[q + 1][(ii + tile_y) * side] = mid;
                }
                if is_even(vr) && is_even(d) {
                    current.push(mid);
                }
                Some(right)
            } else {
                None
            };

            let below = if ii == d - 1 && i != last {
                let below = sample(i + 1, j);
                let mid = blend(here, &[below]).resolve();
                if let Some(c) = children.as_mut() {
                    c[q][d * side + jj + tile_x] = mid;
                    c[q + 2][jj + tile_x] = mid;
                }
                if is_even(d) && is_even(vc) {
                    current.push(mid);
                }
                Some(below)
            } else {
                None
            };

            if let (Some(right), Some(below)) = (right, below) {
                let diagonal = sample(i + 1, j + 1);
                let mid = blend(here, &[right, below, diagonal]).resolve();
                if let Some(c) = children.as_mut() {
                    c[q][d * side + d] = mid;
                    c[q + 1][d * side] = mid;
                    c[q + 2][d] = mid;
                    c[q + 3][0] = mid;
                }
                if is_even(d) {
                    current.push(mid);
                }
            }
        }
    }

    debug_assert_eq!(current.len(), side * side);
    let current = grid_from_vec(d, current);
    let children = children.map(|[nw, ne, sw, se]| {
        [
            grid_from_vec(d, nw),
            grid_from_vec(d, ne),
            grid_from_vec(d, sw),
            grid_from_vec(d, se),
        ]
    });

    (current, children)
}

fn grid_from_vec(cells: usize, heights: Vec<f32>) -> ElevationGrid {
    let side = cells + 1;
    ElevationGrid::from_fn(cells, |row, col| heights[row * side + col])
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
