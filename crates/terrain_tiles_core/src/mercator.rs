//! Spherical web-mercator (EPSG:3857) projection and its power-of-two tile pyramid.
//!
//! Tile `(0, 0)` at zoom `z` is the north-west corner of the projected square `[-POLE, POLE]²`; `x` grows eastward and `y`
//! grows southward. All tile extents produced here are in projected meters.

use crate::{Extent, LonLat};

use std::f64::consts::PI;

/// Half of the projected world width in meters.
pub const POLE: f64 = 20037508.34;
/// Full projected world width in meters.
pub const POLE2: f64 = 2.0 * POLE;
/// The latitude (degrees) where the projected square ends.
pub const MAX_LAT: f64 = 85.0511287798;
pub const MIN_LAT: f64 = -MAX_LAT;

/// The projected square in meters.
pub const EXTENT_MERC: Extent = Extent::new(LonLat::new(-POLE, -POLE), LonLat::new(POLE, POLE));

/// Projects degrees into mercator meters.
#[inline]
pub fn forward(lon_lat: LonLat) -> LonLat {
    LonLat::new(
        lon_lat.lon * POLE / 180.0,
        ((90.0 + lon_lat.lat) * PI / 360.0).tan().ln() / (PI / 180.0) * POLE / 180.0,
    )
}

/// Unprojects mercator meters into degrees.
#[inline]
pub fn inverse(merc: LonLat) -> LonLat {
    let lat = 180.0 / PI * (2.0 * (merc.lat / POLE * PI).exp().atan() - PI / 2.0);
    LonLat::new(180.0 * merc.lon / POLE, lat)
}

/// Side length in meters of one tile at `zoom`.
#[inline]
pub fn tile_size(zoom: u8) -> f64 {
    POLE2 / (1u64 << zoom) as f64
}

/// Canonical projected bounds of tile `(x, y)` at `zoom`.
#[inline]
pub fn tile_extent(x: u32, y: u32, zoom: u8) -> Extent {
    let size = tile_size(zoom);
    Extent::new(
        LonLat::new(-POLE + x as f64 * size, POLE - (y as f64 + 1.0) * size),
        LonLat::new(-POLE + (x as f64 + 1.0) * size, POLE - y as f64 * size),
    )
}

/// Tile coordinates of the tile containing the projected point `merc` at `zoom`. Points on the far east or south border are
/// clamped into the last tile.
#[inline]
pub fn tile_containing(merc: LonLat, zoom: u8) -> (u32, u32) {
    let size = tile_size(zoom);
    let last = ((1u64 << zoom) - 1) as f64;
    let x = ((POLE + merc.lon) / size).floor().max(0.0).min(last);
    let y = ((POLE - merc.lat) / size).floor().max(0.0).min(last);
    (x as u32, y as u32)
}

/// Recovers tile coordinates from a tile's projected extent, the inverse of `tile_extent` for well-formed input.
#[inline]
pub fn tile_of_extent(extent: &Extent) -> (u32, u32) {
    let x = ((-POLE - extent.west()).abs() / extent.width()).round();
    let y = ((POLE - extent.north()).abs() / extent.height()).round();
    (x as u32, y as u32)
}

/// Returns `true` iff `lat` (degrees) can be projected into the tile pyramid.
#[inline]
pub fn lat_in_range(lat: f64) -> bool {
    (MIN_LAT..=MAX_LAT).contains(&lat)
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

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "{} != {} (eps {})", a, b, eps);
    }

    #[test]
    fn forward_inverse_round_trip() {
        for &(lon, lat) in &[(0.0, 0.0), (37.6, 55.75), (-122.4, 37.8), (179.0, -80.0)] {
            let p = inverse(forward(LonLat::new(lon, lat)));
            assert_close(p.lon, lon, 1e-9);
            assert_close(p.lat, lat, 1e-9);
        }
    }

    #[test]
    fn max_lat_projects_to_pole() {
        assert_close(forward(LonLat::new(180.0, MAX_LAT)).lat, POLE, 1e-2);
        assert_close(forward(LonLat::new(180.0, MAX_LAT)).lon, POLE, 1e-9);
    }

    #[test]
    fn zoom_zero_tile_is_whole_square() {
        assert_eq!(tile_extent(0, 0, 0), EXTENT_MERC);
    }

    #[test]
    fn tile_extents_subdivide_parent() {
        let parent = tile_extent(3, 5, 4);
        let nw_child = tile_extent(6, 10, 5);
        let se_child = tile_extent(7, 11, 5);
        assert_eq!(nw_child.west(), parent.west());
        assert_eq!(nw_child.north(), parent.north());
        assert_close(se_child.east(), parent.east(), 1e-6);
        assert_close(se_child.south(), parent.south(), 1e-6);
    }

    #[test]
    fn containing_tile_round_trips_through_extent() {
        let zoom = 7;
        let merc = forward(LonLat::new(12.5, 41.9));
        let (x, y) = tile_containing(merc, zoom);
        let extent = tile_extent(x, y, zoom);
        assert!(extent.contains(merc));
        assert_eq!(tile_of_extent(&extent), (x, y));
    }

    #[test]
    fn far_border_is_clamped_into_last_tile() {
        assert_eq!(tile_containing(LonLat::new(POLE, -POLE), 2), (3, 3));
        assert_eq!(tile_containing(LonLat::new(-POLE, POLE), 2), (0, 0));
    }
}
