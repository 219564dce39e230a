use crate::SharedGrid;

use terrain_tiles_core::{TileKey, TileOffset};

/// Ancestors at or above this zoom are too coarse to be trusted for positive heights near sea level.
pub const SEA_LEVEL_ANCESTOR_ZOOM: u8 = 8;

/// How a provider fills gaps from an ancestor tile.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FallbackPolicy {
    /// Sample the ancestor as is.
    Ancestor,
    /// Sample the ancestor, but clamp positive heights to `0` when the ancestor zoom is at most `SEA_LEVEL_ANCESTOR_ZOOM`.
    AncestorSeaLevelClamped,
}

/// An ancestor grid positioned over the tile being decoded.
///
/// Heights are looked up with tile-normalized coordinates `(u, v)` of the current tile, where `(0, 0)` is the north-west
/// corner and `(1, 1)` the south-east corner.
#[derive(Clone, Debug)]
pub struct ParentFallback {
    grid: SharedGrid,
    offset: TileOffset,
    clamp_positive: bool,
}

impl ParentFallback {
    /// `ancestor_key` must be an ancestor of `key` and `grid` must be its decoded heights.
    pub fn new(key: &TileKey, ancestor_key: &TileKey, grid: SharedGrid, policy: FallbackPolicy) -> Self {
        let clamp_positive = policy == FallbackPolicy::AncestorSeaLevelClamped
            && ancestor_key.zoom <= SEA_LEVEL_ANCESTOR_ZOOM;

        Self {
            grid,
            offset: key.offset_in(ancestor_key),
            clamp_positive,
        }
    }

    #[inline]
    pub fn clamps_positive(&self) -> bool {
        self.clamp_positive
    }

    /// The ancestor's height at `(u, v)` of the current tile, bilinearly interpolated.
    pub fn height_at(&self, u: f64, v: f64) -> f32 {
        let cells = self.grid.grid_size() as f64;
        let col = (self.offset.x + u) * self.offset.scale * cells;
        let row = (self.offset.y + v) * self.offset.scale * cells;
        let height = self.grid.sample_bilinear(row, col);

        if self.clamp_positive && height > 0.0 {
            0.0
        } else {
            height
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;
    use crate::ElevationGrid;

    use std::sync::Arc;

    #[test]
    fn samples_the_covered_quarter() {
        // Heights equal the column index of a 4-cell grid.
        let parent = TileKey::new(2, 1, 3);
        let grid = Arc::new(ElevationGrid::from_fn(4, |_, col| col as f32));
        let south_east = parent.child(1, 1);

        let fallback = ParentFallback::new(&south_east, &parent, grid, FallbackPolicy::Ancestor);
        assert_eq!(fallback.height_at(0.0, 0.0), 2.0);
        assert_eq!(fallback.height_at(0.5, 0.5), 3.0);
        assert_eq!(fallback.height_at(1.0, 1.0), 4.0);
    }

    #[test]
    fn coarse_ancestors_clamp_positive_heights() {
        let ancestor = TileKey::new(1, 1, 8);
        let key = TileKey::new(4, 4, 10);
        let grid = Arc::new(ElevationGrid::filled(2, 120.0));

        let clamped = ParentFallback::new(
            &key,
            &ancestor,
            grid.clone(),
            FallbackPolicy::AncestorSeaLevelClamped,
        );
        assert!(clamped.clamps_positive());
        assert_eq!(clamped.height_at(0.3, 0.3), 0.0);

        let fine_ancestor = TileKey::new(1, 1, 9);
        let key = TileKey::new(2, 2, 10);
        let unclamped = ParentFallback::new(
            &key,
            &fine_ancestor,
            grid,
            FallbackPolicy::AncestorSeaLevelClamped,
        );
        assert!(!unclamped.clamps_positive());
        assert_eq!(unclamped.height_at(0.3, 0.3), 120.0);
    }
}
