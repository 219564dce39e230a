//! The shared provider machinery.
//!
//! One `TerrainProvider` serves every `SourceFormat`. The format decides how a payload is decoded and which heights count as
//! missing; fetching, de-duplication, resampling, caching and point queries are the same for all of them.
//!
//! A provider lives on the thread of its `LocalSpawn` executor. The cache and the in-flight map are still guarded by locks,
//! so a grid batch (a tile and the children seeded from it) is always published in one step.

use crate::{
    clamp_node_zoom, grid_size_at, wms_bil16_url, ConfigError, FetchCoordinator, HeightCallback, LoadRequest, Loader,
    ProviderConfig, Response, Segment, SharedFetch, SubdomainRotation, Terrain, TerrainError, Transport, UrlRewrite,
    UrlTemplate, MAX_SUPPORTED_ZOOM,
};

use terrain_tiles_core::{mercator, Extent, LonLat, TileGroup, TileKey};
use terrain_tiles_storage::{
    entry_height, ground_height, resample, CacheEntry, ElevationCache, NoDataRule, ParentFallback, Payload, RasterShape,
    SharedGrid, SourceFormat, TileGrid,
};

use futures::future::{FutureExt, LocalBoxFuture};
use futures::task::{LocalSpawn, LocalSpawnExt};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

/// Called with every grid (or `None`) right before it is handed to a segment.
pub type LoadListener = Rc<dyn Fn(&TileKey, Option<&TileGrid>)>;

/// An elevation source backed by a `Transport`.
///
/// Clones share the cache, the loader and the in-flight fetches.
pub struct TerrainProvider<T, S> {
    inner: Rc<ProviderInner<T, S>>,
}

impl<T, S> Clone for TerrainProvider<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

struct ProviderInner<T, S> {
    config: ProviderConfig,
    transport: T,
    spawner: S,
    cache: ElevationCache,
    fetches: FetchCoordinator,
    loader: Loader<S>,
    no_data: NoDataRule,
    subdomains: SubdomainRotation,
    url: RefCell<UrlTemplate>,
    url_rewrite: RefCell<Option<UrlRewrite>>,
    load_listeners: RefCell<Vec<LoadListener>>,
    max_node_zoom: Cell<u8>,
}

impl<T, S> TerrainProvider<T, S>
where
    T: Transport + 'static,
    S: LocalSpawn + Clone + 'static,
{
    pub fn new(config: ProviderConfig, transport: T, spawner: S) -> Result<Self, ConfigError> {
        config.validate()?;

        let no_data = config
            .format
            .no_data_rule(&config.no_data_values, config.height_factor);
        let cache = match config.max_cached_tiles {
            Some(max) => ElevationCache::with_max_entries(max),
            None => ElevationCache::new(),
        };
        let loader = Loader::new(spawner.clone(), config.max_requests);
        let subdomains = SubdomainRotation::new(config.subdomains.clone(), config.requests_per_subdomain);
        let url = RefCell::new(UrlTemplate::new(config.url.clone()));
        let max_node_zoom = Cell::new(clamp_node_zoom(&config.grid_size_by_zoom, u8::MAX));

        tracing::debug!(name = %config.name, format = ?config.format, "creating terrain provider");

        Ok(Self {
            inner: Rc::new(ProviderInner {
                config,
                transport,
                spawner,
                cache,
                fetches: FetchCoordinator::new(),
                loader,
                no_data,
                subdomains,
                url,
                url_rewrite: RefCell::new(None),
                load_listeners: RefCell::new(Vec::new()),
                max_node_zoom,
            }),
        })
    }

    #[inline]
    pub fn config(&self) -> &ProviderConfig {
        &self.inner.config
    }

    #[inline]
    pub fn format(&self) -> SourceFormat {
        self.inner.config.format
    }

    #[inline]
    pub fn cache(&self) -> &ElevationCache {
        &self.inner.cache
    }

    #[inline]
    pub fn loader(&self) -> &Loader<S> {
        &self.inner.loader
    }

    /// Number of network requests issued so far.
    #[inline]
    pub fn fetch_count(&self) -> u64 {
        self.inner.fetches.issued()
    }

    #[inline]
    pub fn no_data(&self) -> &NoDataRule {
        &self.inner.no_data
    }

    pub fn url(&self) -> String {
        self.inner.url.borrow().as_str().to_string()
    }

    /// Replaces the URL template. Requests already in flight keep their URL.
    pub fn set_url(&self, template: impl Into<String>) {
        *self.inner.url.borrow_mut() = UrlTemplate::new(template);
    }

    /// Installs (or removes) a hook that may replace the URL of segment loads.
    pub fn set_url_rewrite(&self, rewrite: Option<UrlRewrite>) {
        *self.inner.url_rewrite.borrow_mut() = rewrite;
    }

    pub fn set_max_node_zoom(&self, zoom: u8) {
        self.inner
            .max_node_zoom
            .set(clamp_node_zoom(&self.inner.config.grid_size_by_zoom, zoom));
    }

    pub fn on_load(&self, listener: impl Fn(&TileKey, Option<&TileGrid>) + 'static) {
        self.inner.load_listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Called whenever the loader drains its queue.
    pub fn on_loadend(&self, listener: impl Fn() + 'static) {
        self.inner.loader.on_loadend(listener);
    }

    /// Whether `segment` lies inside the coverage of this source.
    pub fn is_ready_to_load(&self, segment: &dyn Segment) -> bool {
        self.inner.config.extent.overlaps(&segment.extent_lon_lat())
    }

    /// The URL a segment load of `key` would use.
    pub fn segment_url(&self, key: &TileKey, extent: &Extent) -> String {
        self.inner.segment_url(key, extent)
    }

    /// The key a point query at `lon_lat` resolves against.
    pub fn point_key(&self, lon_lat: LonLat, zoom: Option<u8>) -> TileKey {
        self.inner
            .point_key(lon_lat, zoom.unwrap_or(self.inner.config.max_zoom))
    }

    /// Like `get_height_async`, but as a future.
    pub fn height_at(&self, lon_lat: LonLat, zoom: Option<u8>) -> LocalBoxFuture<'static, f32> {
        let inner = Rc::clone(&self.inner);
        async move {
            if !mercator::lat_in_range(lon_lat.lat) {
                return 0.0;
            }
            let key = inner.point_key(lon_lat, zoom.unwrap_or(inner.config.max_zoom));
            let cached = inner.cache.get(&key);
            match cached {
                Some(entry) => entry_height(mercator::forward(lon_lat), &entry),
                None => inner.resolve_height(lon_lat, key).await,
            }
        }
        .boxed_local()
    }
}

impl<T, S> ProviderInner<T, S>
where
    T: Transport + 'static,
    S: LocalSpawn + Clone + 'static,
{
    fn point_key(&self, lon_lat: LonLat, zoom: u8) -> TileKey {
        let key = TileKey::containing(lon_lat, zoom.min(MAX_SUPPORTED_ZOOM));
        if self.config.format.uses_tile_groups() {
            key
        } else {
            TileKey::with_group(key.x, key.y, key.zoom, TileGroup::Common)
        }
    }

    fn template_url(&self, key: &TileKey, extent: &Extent) -> String {
        let url = self.url.borrow();
        match self.config.format {
            SourceFormat::Bil16 => wms_bil16_url(url.as_str(), &self.config.wms_layers, extent, self.config.image_size),
            _ => {
                let subdomain = if url.uses_subdomain() {
                    self.subdomains.next()
                } else {
                    ""
                };
                url.expand(key, subdomain, self.config.api_key.as_deref())
            }
        }
    }

    fn segment_url(&self, key: &TileKey, extent: &Extent) -> String {
        let rewrite = self.url_rewrite.borrow().clone();
        let template = self.template_url(key, extent);
        match rewrite {
            Some(rewrite) => rewrite(key, &template).unwrap_or(template),
            None => template,
        }
    }

    /// Joins or starts the single fetch of `key`. `url` is only built if a new request is issued.
    fn fetch_shared(&self, key: TileKey, url: impl FnOnce() -> String) -> SharedFetch {
        let kind = self.config.format.payload_kind();
        let transport = &self.transport;
        self.fetches.fetch_once(key, || {
            let url = url();
            tracing::trace!(tile = %key, url = %url, "fetching tile");
            transport.fetch(&url, kind)
        })
    }

    /// Decodes `payload` for `key` and publishes the tile together with any children seeded from it.
    ///
    /// `ancestor` comes from the renderer's quad-tree; without one, the nearest cached ancestor is used for gap filling.
    fn decode_and_publish(
        &self,
        key: &TileKey,
        payload: &Payload,
        ancestor: Option<(TileKey, SharedGrid)>,
    ) -> Result<SharedGrid, TerrainError> {
        let format = self.config.format;
        let raster = match format.decode(payload, self.config.height_factor) {
            Ok(raster) => raster,
            Err(e) => {
                self.cache.set(*key, CacheEntry::missing(key.extent()));
                return Err(e.into());
            }
        };

        let fallback = ancestor
            .or_else(|| self.cache.nearest_ancestor_with_heights(key))
            .map(|(ancestor_key, grid)| {
                tracing::debug!(tile = %key, ancestor = %ancestor_key, "filling gaps from ancestor");
                ParentFallback::new(key, &ancestor_key, grid, format.fallback_policy())
            });

        let seed_children = key.zoom < self.config.max_zoom;
        let resampled = resample(
            &raster,
            self.config.plain_grid_size,
            &self.no_data,
            fallback.as_ref(),
            seed_children,
        );
        if resampled.shape == RasterShape::Raw {
            tracing::debug!(tile = %key, side = raster.side(), "raster side is not a power of two, copying as is");
        }

        let current: SharedGrid = Arc::new(resampled.current);
        let mut batch = Vec::with_capacity(5);
        if let Some(children) = resampled.children {
            tracing::debug!(tile = %key, "seeding child grids");
            batch.extend(
                key.children()
                    .iter()
                    .zip(Vec::from(children))
                    .map(|(child, grid)| (*child, CacheEntry::new(Some(Arc::new(grid)), child.extent()))),
            );
        }
        // Last in, so a bounded cache evicts seeded children before the requested tile.
        batch.push((*key, CacheEntry::new(Some(Arc::clone(&current)), key.extent())));
        self.cache.publish(batch);

        Ok(current)
    }

    /// Like `decode_and_publish`, but a tile that fails to decode simply has no heights.
    fn decode_or_missing(
        &self,
        key: &TileKey,
        payload: &Payload,
        ancestor: Option<(TileKey, SharedGrid)>,
    ) -> Option<SharedGrid> {
        match self.decode_and_publish(key, payload, ancestor) {
            Ok(grid) => Some(grid),
            Err(e) => {
                tracing::warn!(tile = %key, "failed to decode elevation tile: {}", e);
                None
            }
        }
    }

    fn apply(&self, segment: &dyn Segment, key: &TileKey, heights: Option<SharedGrid>) {
        let listeners: Vec<LoadListener> = self.load_listeners.borrow().clone();
        if !listeners.is_empty() {
            let tile = heights.as_ref().map(|grid| TileGrid {
                grid: Arc::clone(grid),
                extent: key.extent(),
            });
            for listener in listeners {
                listener(key, tile.as_ref());
            }
        }
        segment.apply_terrain(heights);
    }

    fn complete_load(&self, segment: &dyn Segment, key: &TileKey, force_loading: bool, response: Response) {
        match response {
            Response::Ready(payload) => {
                // A point query may have decoded the tile while this load was queued.
                let heights = match self.cache.peek(key) {
                    Some(entry) => entry.heights,
                    None => self.decode_or_missing(key, &payload, segment.ancestor_terrain()),
                };
                if force_loading || segment.still_relevant() {
                    self.apply(segment, key, heights);
                } else {
                    tracing::trace!(tile = %key, "dropping result for segment that is no longer relevant");
                    segment.terrain_load_aborted();
                }
            }
            Response::Error(e) => {
                tracing::warn!(tile = %key, "terrain request failed: {}", e);
                if !self.cache.contains(key) {
                    self.cache.set(*key, CacheEntry::missing(key.extent()));
                }
                if force_loading || segment.still_relevant() {
                    self.apply(segment, key, None);
                } else {
                    segment.terrain_load_aborted();
                }
            }
            Response::Abort => segment.terrain_load_aborted(),
        }
    }

    /// Fetches and decodes the tile `key` for a point query at `lon_lat`, retrying once at the native zoom.
    async fn resolve_height(self: Rc<Self>, lon_lat: LonLat, mut key: TileKey) -> f32 {
        let merc = mercator::forward(lon_lat);
        let mut first_attempt = true;
        loop {
            let extent = key.extent();
            let response = self.fetch_shared(key, || self.template_url(&key, &extent)).await;

            // Every waiter of a shared fetch gets the payload; only the first one decodes it.
            if let Some(entry) = self.cache.peek(&key) {
                return entry_height(merc, &entry);
            }

            match response {
                Response::Ready(payload) => {
                    return match self.decode_or_missing(&key, &payload, None) {
                        Some(grid) => ground_height(merc, &extent, &grid),
                        None => 0.0,
                    };
                }
                Response::Error(e) => {
                    let native = self.config.max_native_zoom;
                    if first_attempt && key.zoom > native {
                        tracing::debug!(tile = %key, native_zoom = native, "retrying height query at native zoom");
                        first_attempt = false;
                        key = self.point_key(lon_lat, native);
                        if let Some(entry) = self.cache.get(&key) {
                            return entry_height(merc, &entry);
                        }
                        continue;
                    }
                    tracing::warn!(tile = %key, "height query failed: {}", e);
                    self.cache.set(key, CacheEntry::missing(extent));
                    return 0.0;
                }
                Response::Abort => return 0.0,
            }
        }
    }
}

impl<T, S> Terrain for TerrainProvider<T, S>
where
    T: Transport + 'static,
    S: LocalSpawn + Clone + 'static,
{
    fn name(&self) -> &str {
        &self.inner.config.name
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn load_terrain(&self, segment: Rc<dyn Segment>, force_loading: bool) {
        let key = segment.tile_key();

        if !self.is_ready_to_load(&*segment) {
            tracing::debug!(tile = %key, "segment is outside the coverage extent");
            segment.elevations_not_exist();
            return;
        }

        if let Some(entry) = self.inner.cache.get(&key) {
            tracing::debug!(tile = %key, "terrain cache hit");
            self.inner.apply(&*segment, &key, entry.heights);
            return;
        }
        tracing::debug!(tile = %key, "terrain cache miss");

        let extent = segment.extent();
        let url = self.inner.segment_url(&key, &extent);

        let filter_segment = Rc::clone(&segment);
        let filter = move || force_loading || filter_segment.still_relevant();

        let start_inner = Rc::clone(&self.inner);
        let start_url = url.clone();
        let start = move || start_inner.fetch_shared(key, move || start_url).boxed();

        let inner = Rc::clone(&self.inner);
        self.inner.loader.load(
            LoadRequest::new(key, url, filter, start),
            move |response| inner.complete_load(&*segment, &key, force_loading, response),
        );
    }

    fn get_height_async(&self, lon_lat: LonLat, callback: HeightCallback, zoom: Option<u8>) -> bool {
        if !mercator::lat_in_range(lon_lat.lat) {
            callback(0.0);
            return true;
        }

        let key = self
            .inner
            .point_key(lon_lat, zoom.unwrap_or(self.inner.config.max_zoom));
        if let Some(entry) = self.inner.cache.get(&key) {
            callback(entry_height(mercator::forward(lon_lat), &entry));
            return true;
        }

        let slot = Rc::new(Cell::new(Some(callback)));
        let task_slot = Rc::clone(&slot);
        let inner = Rc::clone(&self.inner);
        let task = async move {
            let height = inner.resolve_height(lon_lat, key).await;
            if let Some(callback) = task_slot.take() {
                callback(height);
            }
        };
        if let Err(e) = self.inner.spawner.spawn_local(task) {
            tracing::warn!(tile = %key, "failed to spawn height query: {}", e);
            if let Some(callback) = slot.take() {
                callback(0.0);
            }
            return true;
        }

        false
    }

    fn clear_cache(&self) {
        self.inner.cache.clear();
        self.inner.fetches.forget_all();
    }

    fn abort_loading(&self) {
        self.inner.loader.abort_all();
    }

    fn is_blur(&self, zoom: u8) -> bool {
        self.inner.config.format.is_blur(zoom)
    }

    fn grid_size_for_zoom(&self, zoom: u8) -> usize {
        grid_size_at(&self.inner.config.grid_size_by_zoom, zoom)
    }

    fn plain_grid_size(&self) -> usize {
        self.inner.config.plain_grid_size
    }

    fn min_zoom(&self) -> u8 {
        self.inner.config.min_zoom
    }

    fn max_zoom(&self) -> u8 {
        self.inner.config.max_zoom
    }

    fn max_node_zoom(&self) -> u8 {
        self.inner.max_node_zoom.get()
    }
}
