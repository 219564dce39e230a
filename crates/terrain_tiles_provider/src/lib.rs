//! Elevation providers for a tiled globe renderer.
//!
//! A `TerrainProvider` turns requests from the renderer's quad-tree (`load_terrain`) and from point queries
//! (`get_height_async`, `height_at`) into fetches through a `Transport`, then decodes, resamples and caches the result. Both
//! paths share one `FetchCoordinator`, so a tile is never requested twice at the same time, and one `ElevationCache`, so
//! a tile that is cached (including one seeded by its parent) is never requested again.
//!
//! ```
//! use terrain_tiles_provider::prelude::*;
//!
//! use futures::executor::LocalPool;
//! use futures::future::{BoxFuture, FutureExt};
//!
//! struct Offline;
//!
//! impl Transport for Offline {
//!     fn fetch(&self, url: &str, _kind: PayloadKind) -> BoxFuture<'static, Response> {
//!         let error = TransportError::network(url, "offline");
//!         async move { Response::Error(error) }.boxed()
//!     }
//! }
//!
//! let mut pool = LocalPool::new();
//! let provider = TerrainProvider::new(ProviderConfig::default(), Offline, pool.spawner()).unwrap();
//!
//! let height = pool.run_until(provider.height_at(LonLat::new(7.0, 46.0), Some(10)));
//! assert_eq!(height, 0.0);
//! ```

mod config;
mod error;
mod fetch;
mod loader;
mod provider;
mod segment;
mod terrain;
mod transport;
mod url;

pub use config::{bil_plain_grid_size, ConfigError, ProviderConfig, DDM_URL, MAPBOX_URL, MAX_SUPPORTED_ZOOM};
pub use error::{TerrainError, TransportError};
pub use fetch::{FetchCoordinator, SharedFetch};
pub use loader::{Completion, LoadRequest, Loader, RelevanceFilter, StartRequest, MAX_REQUESTS};
pub use provider::{LoadListener, TerrainProvider};
pub use segment::{tile_center_lon_lat, Segment};
pub use terrain::{EmptyTerrain, HeightCallback, Terrain};
pub use transport::{Response, Transport};
pub use url::{wms_bil16_url, SubdomainRotation, UrlRewrite, UrlTemplate, BIL16_MIME, WEB_MERCATOR_SRS, WMS_VERSION};

pub(crate) use terrain::{clamp_node_zoom, grid_size_at};

pub mod prelude {
    pub use super::{
        EmptyTerrain, ProviderConfig, Response, Segment, Terrain, TerrainError, TerrainProvider, Transport,
        TransportError,
    };

    pub use terrain_tiles_core::{LonLat, TileKey};
    pub use terrain_tiles_storage::{PayloadKind, SharedGrid, SourceFormat};
}
