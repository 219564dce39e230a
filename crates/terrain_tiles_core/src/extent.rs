use crate::LonLat;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle given by its south-west and north-east corners.
///
/// Every cached elevation grid carries the extent it was produced for, and that extent is always the canonical bounds of the
/// grid's tile (see `TileKey::extent`).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Extent {
    pub south_west: LonLat,
    pub north_east: LonLat,
}

impl Extent {
    #[inline]
    pub const fn new(south_west: LonLat, north_east: LonLat) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// The whole geographic world in degrees.
    pub const WORLD: Self = Self::new(LonLat::new(-180.0, -90.0), LonLat::new(180.0, 90.0));

    #[inline]
    pub fn west(&self) -> f64 {
        self.south_west.lon
    }

    #[inline]
    pub fn south(&self) -> f64 {
        self.south_west.lat
    }

    #[inline]
    pub fn east(&self) -> f64 {
        self.north_east.lon
    }

    #[inline]
    pub fn north(&self) -> f64 {
        self.north_east.lat
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.east() - self.west()
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.north() - self.south()
    }

    #[inline]
    pub fn center(&self) -> LonLat {
        LonLat::new(
            0.5 * (self.west() + self.east()),
            0.5 * (self.south() + self.north()),
        )
    }

    /// Returns `true` iff `p` lies inside or on the border of the extent.
    #[inline]
    pub fn contains(&self, p: LonLat) -> bool {
        self.west() <= p.lon && p.lon <= self.east() && self.south() <= p.lat && p.lat <= self.north()
    }

    /// Returns `true` iff the two extents share any area or border.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.west() <= other.east()
            && other.west() <= self.east()
            && self.south() <= other.north()
            && other.south() <= self.north()
    }

    /// `WEST,SOUTH,EAST,NORTH`, the bounding box order of WMS 1.1.1.
    pub fn to_bbox_string(&self) -> String {
        format!(
            "{},{},{},{}",
            self.west(),
            self.south(),
            self.east(),
            self.north()
        )
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

    #[test]
    fn overlap_includes_shared_border() {
        let a = Extent::new(LonLat::new(0.0, 0.0), LonLat::new(10.0, 10.0));
        let b = Extent::new(LonLat::new(10.0, 0.0), LonLat::new(20.0, 10.0));
        let c = Extent::new(LonLat::new(10.5, 0.0), LonLat::new(20.0, 10.0));

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(Extent::WORLD.overlaps(&a));
    }

    #[test]
    fn bbox_is_west_south_east_north() {
        let e = Extent::new(LonLat::new(-1.5, -2.0), LonLat::new(3.0, 4.25));
        assert_eq!(e.to_bbox_string(), "-1.5,-2,3,4.25");
        assert_eq!(e.width(), 4.5);
        assert_eq!(e.height(), 6.25);
    }
}
