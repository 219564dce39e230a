//! Everything that happens to an elevation tile after its bytes arrive.
//!
//! - `SourceFormat` and the `decode` functions turn a `Payload` into a `DecodedRaster` of heights
//! - `NoDataRule` flags sentinel heights, and `ParentFallback` fills them from a cached ancestor
//! - `resample` maps a raster onto the `ElevationGrid` of its tile and, when the raster has twice the resolution, onto the
//!   grids of its four children with bit-identical shared borders
//! - `ElevationCache` stores the grids by `TileKey`, optionally bounded by an LRU policy
//! - `ground_height` answers point queries against a grid

pub mod cache;
pub mod decode;
pub mod fallback;
pub mod format;
pub mod grid;
pub mod lru;
pub mod no_data;
pub mod query;
pub mod resample;

pub use cache::{CacheEntry, CacheStats, ElevationCache};
pub use decode::{
    decode_int16, decode_rgb, decode_rgb_payload, rgb_to_height, DecodeError, DecodedRaster, Payload, PayloadKind,
    RGB_BASE_HEIGHT,
};
pub use fallback::{FallbackPolicy, ParentFallback, SEA_LEVEL_ANCESTOR_ZOOM};
pub use format::{SourceFormat, RGB_NO_DATA_THRESHOLD};
pub use grid::{Border, ElevationGrid, SharedGrid, TileGrid};
pub use lru::{LruCache, SmallKeyLruCache};
pub use no_data::NoDataRule;
pub use query::{entry_height, ground_height};
pub use resample::{resample, RasterShape, Resampled};

// Hash types to use for small keys like `TileKey`.
pub type SmallKeyHashMap<K, V> = ahash::AHashMap<K, V>;
pub type SmallKeyBuildHasher = ahash::RandomState;

pub mod prelude {
    pub use super::{
        ground_height, resample, CacheEntry, DecodedRaster, ElevationCache, ElevationGrid, FallbackPolicy, NoDataRule,
        ParentFallback, Payload, PayloadKind, RasterShape, SharedGrid, SourceFormat, TileGrid,
    };
}
