use terrain_tiles_core::{mercator, Extent, LonLat, TileKey};
use terrain_tiles_storage::SharedGrid;

use auto_impl::auto_impl;

/// A node of the renderer's quad-tree that wants elevations.
///
/// The provider never mutates a segment; it only reads its address and hands it a grid (or `None`) through
/// `apply_terrain`.
#[auto_impl(&, Box, Rc, Arc)]
pub trait Segment {
    fn tile_key(&self) -> TileKey;

    /// Projected bounds. Defaults to the canonical bounds of the tile.
    fn extent(&self) -> Extent {
        self.tile_key().extent()
    }

    /// Geographic bounds in degrees.
    fn extent_lon_lat(&self) -> Extent {
        let extent = self.extent();
        Extent::new(
            mercator::inverse(extent.south_west),
            mercator::inverse(extent.north_east),
        )
    }

    /// Whether the renderer still wants this segment. Checked before dispatch and again before a result is applied.
    fn still_relevant(&self) -> bool;

    /// Receives the tile's grid, or `None` when the tile has no elevation data.
    fn apply_terrain(&self, heights: Option<SharedGrid>);

    /// Called instead of a fetch when the tile lies outside the provider's coverage.
    fn elevations_not_exist(&self) {
        self.apply_terrain(None);
    }

    /// Called when a load for this segment was cancelled. The segment may be asked again later.
    fn terrain_load_aborted(&self) {}

    /// The nearest ancestor that already has terrain, if the quad-tree knows one.
    fn ancestor_terrain(&self) -> Option<(TileKey, SharedGrid)> {
        None
    }
}

/// Geographic center of `key`, handy for point queries against a segment.
pub fn tile_center_lon_lat(key: &TileKey) -> LonLat {
    mercator::inverse(key.extent().center())
}
