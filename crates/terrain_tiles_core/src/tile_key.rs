use crate::{mercator, Extent, LonLat};

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Disambiguates polar tiles that share `(x, y, zoom)` with the equatorial mercator pyramid.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum TileGroup {
    /// No group; the mercator pyramid between the latitude limits.
    Common = 0,
    North = 1,
    South = 2,
}

impl Default for TileGroup {
    fn default() -> Self {
        TileGroup::Common
    }
}

impl TileGroup {
    /// The group of a tile containing latitude `lat` (degrees) when the mercator pyramid ends at `max_lat`.
    #[inline]
    pub fn from_lat(lat: f64, max_lat: f64) -> Self {
        if lat > max_lat {
            TileGroup::North
        } else if lat < -max_lat {
            TileGroup::South
        } else {
            TileGroup::Common
        }
    }
}

/// The canonical address of one raster tile in the quad-tree pyramid.
///
/// Keys are plain values: they are derived deterministically from coordinates and zoom, and they never change once built.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct TileKey {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
    pub group: TileGroup,
}

/// The position of a tile inside one of its ancestors, in units of the tile's own size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileOffset {
    /// Column of the tile within the ancestor, `0..2^levels`.
    pub x: f64,
    /// Row of the tile within the ancestor, `0..2^levels`.
    pub y: f64,
    /// `1 / 2^levels`, the ancestor-units length of one tile.
    pub scale: f64,
}

impl TileKey {
    #[inline]
    pub const fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self::with_group(x, y, zoom, TileGroup::Common)
    }

    #[inline]
    pub const fn with_group(x: u32, y: u32, zoom: u8, group: TileGroup) -> Self {
        Self { x, y, zoom, group }
    }

    /// The key of the mercator tile at `zoom` that contains `lon_lat` (degrees). The group is derived from the latitude sign
    /// for points beyond the mercator limits.
    #[inline]
    pub fn containing(lon_lat: LonLat, zoom: u8) -> Self {
        let (x, y) = mercator::tile_containing(mercator::forward(lon_lat), zoom);
        Self::with_group(
            x,
            y,
            zoom,
            TileGroup::from_lat(lon_lat.lat, mercator::MAX_LAT),
        )
    }

    /// The key of the tile at `zoom` whose projected bounds are `extent`.
    #[inline]
    pub fn from_extent(extent: &Extent, zoom: u8, group: TileGroup) -> Self {
        let (x, y) = mercator::tile_of_extent(extent);
        Self::with_group(x, y, zoom, group)
    }

    /// Canonical projected bounds of this tile.
    #[inline]
    pub fn extent(&self) -> Extent {
        mercator::tile_extent(self.x, self.y, self.zoom)
    }

    /// The tile one level up that covers this one, or `None` at the root.
    #[inline]
    pub fn parent(&self) -> Option<Self> {
        self.ancestor(self.zoom.checked_sub(1)?)
    }

    /// The covering tile at `zoom`, which must not be deeper than `self`.
    #[inline]
    pub fn ancestor(&self, zoom: u8) -> Option<Self> {
        if zoom > self.zoom {
            return None;
        }
        let levels = self.zoom - zoom;
        Some(Self::with_group(
            self.x >> levels,
            self.y >> levels,
            zoom,
            self.group,
        ))
    }

    /// All strict ancestors, from the parent up to the root.
    #[inline]
    pub fn ancestors(&self) -> impl Iterator<Item = TileKey> {
        let key = *self;
        (0..key.zoom).rev().filter_map(move |z| key.ancestor(z))
    }

    /// The child one level deeper at column offset `dx` and row offset `dy` (each `0` or `1`).
    #[inline]
    pub fn child(&self, dx: u32, dy: u32) -> Self {
        debug_assert!(dx < 2 && dy < 2);
        Self::with_group(self.x * 2 + dx, self.y * 2 + dy, self.zoom + 1, self.group)
    }

    /// The four children in row-major order: north-west, north-east, south-west, south-east.
    #[inline]
    pub fn children(&self) -> [TileKey; 4] {
        [
            self.child(0, 0),
            self.child(1, 0),
            self.child(0, 1),
            self.child(1, 1),
        ]
    }

    /// Where this tile sits inside `ancestor`, which must be an ancestor (or `self`).
    #[inline]
    pub fn offset_in(&self, ancestor: &TileKey) -> TileOffset {
        debug_assert!(ancestor.zoom <= self.zoom);
        let levels = u32::from(self.zoom - ancestor.zoom);
        let dz2 = 1u64 << levels;
        TileOffset {
            x: (u64::from(self.x) - dz2 * u64::from(ancestor.x)) as f64,
            y: (u64::from(self.y) - dz2 * u64::from(ancestor.y)) as f64,
            scale: 1.0 / dz2 as f64,
        }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.x, self.y, self.zoom, self.group as u8
        )
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
