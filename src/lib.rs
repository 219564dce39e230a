//! Elevation tiles for spherical terrain renderers.
//!
//! This library is organized into several crates:
//! - **core**: tile keys, extents, the web-mercator projection and the geometry of point queries
//! - **storage**: decoding of elevation payloads, resampling onto the renderer's grids, the elevation cache
//! - **provider**: fetching tiles through a pluggable transport, with request de-duplication, bounded loading and
//!   cancellation
//!
//! The central guarantee is seam consistency: when a tile is decoded from a raster with twice the grid resolution, the
//! grids of its four children are produced in the same pass, so borders shared between neighbors and between zoom levels
//! are bit-identical no matter which tile is requested first.

pub use terrain_tiles_core as core;
pub use terrain_tiles_storage as storage;

pub mod prelude {
    pub use super::core::prelude::*;
    pub use super::storage::prelude::*;

    #[cfg(feature = "provider")]
    pub use super::provider::prelude::*;
}

#[cfg(feature = "provider")]
pub use terrain_tiles_provider as provider;
