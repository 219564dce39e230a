use crate::{CacheEntry, ElevationGrid};

use terrain_tiles_core::{Extent, LonLat, Ray, RayHit, Vec3};

/// Rays are cast downward from this far above the highest vertex of the queried cell.
const RAY_CLEARANCE: f64 = 100_000.0;

/// Height of the terrain surface at the projected point `merc` inside `extent`.
///
/// The cell containing the point is split into two triangles along its south-west to north-east diagonal, and the height
/// is where a vertical ray through the point meets them. Points outside `extent` are clamped onto its border. Returns `0.0`
/// if neither triangle is hit.
pub fn ground_height(merc: LonLat, extent: &Extent, grid: &ElevationGrid) -> f32 {
    let side = grid.side();
    if side < 2 {
        return grid.heights().first().copied().unwrap_or(0.0);
    }
    let cells = side - 1;
    let cell_w = extent.width() / cells as f64;
    let cell_h = extent.height() / cells as f64;

    let lon = merc.lon.max(extent.west()).min(extent.east());
    let lat = merc.lat.max(extent.south()).min(extent.north());

    // Row 0 is the north edge.
    let last = (cells - 1) as f64;
    let row = (side as f64 - ((lat - extent.south()) / cell_h).ceil() - 1.0)
        .max(0.0)
        .min(last) as usize;
    let col = ((lon - extent.west()) / cell_w).floor().max(0.0).min(last) as usize;

    let west = extent.west() + cell_w * col as f64;
    let north = extent.north() - cell_h * row as f64;
    let south = north - cell_h;
    let east = west + cell_w;

    let vertex = |r: usize, c: usize, x: f64, z: f64| Vec3::new(x, f64::from(grid.get(r, c)), z);
    let sw = vertex(row + 1, col, west, south);
    let se = vertex(row + 1, col + 1, east, south);
    let nw = vertex(row, col, west, north);
    let ne = vertex(row, col + 1, east, north);

    let top = sw.y.max(se.y).max(nw.y).max(ne.y);
    let ray = Ray::new(Vec3::new(lon, top + RAY_CLEARANCE, lat), Vec3::DOWN);

    for &(a, b, c) in &[(sw, se, ne), (sw, ne, nw)] {
        if let RayHit::Inside(p) = ray.hit_triangle(a, b, c) {
            return p.y as f32;
        }
    }

    0.0
}

/// `ground_height` on a cached entry; tiles without elevation data have height `0.0`.
#[inline]
pub fn entry_height(merc: LonLat, entry: &CacheEntry) -> f32 {
    entry
        .heights
        .as_ref()
        .map_or(0.0, |grid| ground_height(merc, &entry.extent, grid))
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
