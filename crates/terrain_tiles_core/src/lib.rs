//! The core data types for addressing an elevation tile pyramid:
//! - `TileKey`: the `(x, y, zoom, group)` address of one raster tile, with parent/child navigation
//! - `LonLat` and `Extent`: geographic (or projected) points and rectangles
//! - `mercator`: the spherical web-mercator projection and its power-of-two tile subdivision
//! - `Vec3` and `Ray`: just enough geometry to intersect a vertical ray with a terrain triangle

pub mod extent;
pub mod int_math;
pub mod lon_lat;
pub mod mercator;
pub mod ray;
pub mod tile_key;

pub use extent::Extent;
pub use int_math::{exact_square_side, is_power_of_two, next_power_of_two};
pub use lon_lat::LonLat;
pub use ray::{Ray, RayHit, Vec3};
pub use tile_key::{TileGroup, TileKey, TileOffset};

pub mod prelude {
    pub use super::{
        exact_square_side, is_power_of_two, mercator, next_power_of_two, Extent, LonLat, Ray, RayHit,
        TileGroup, TileKey, TileOffset, Vec3,
    };
}
