use terrain_tiles_core::{Extent, LonLat, TileKey};
use terrain_tiles_provider::prelude::*;
use terrain_tiles_provider::{UrlRewrite, MAPBOX_URL, MAX_SUPPORTED_ZOOM};
use terrain_tiles_storage::{CacheEntry, ElevationGrid, Payload};
use utilities::data_sets::{bytes_payload, image_payload, int16_tile, random_int16_tile, rgb_tile};

use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future::{BoxFuture, FutureExt};
use pretty_assertions::assert_eq;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

type Reply = Arc<dyn Fn(&str) -> Response + Send + Sync>;

#[derive(Default)]
struct MockState {
    requests: Vec<(String, PayloadKind)>,
    held: Vec<(String, oneshot::Sender<Response>)>,
}

/// Records every request. Either answers right away or holds responses until `release`.
#[derive(Clone)]
struct MockTransport {
    state: Arc<Mutex<MockState>>,
    reply: Option<Reply>,
}

impl MockTransport {
    fn replying(reply: impl Fn(&str) -> Response + Send + Sync + 'static) -> Self {
        Self {
            state: Default::default(),
            reply: Some(Arc::new(reply)),
        }
    }

    fn holding() -> Self {
        Self {
            state: Default::default(),
            reply: None,
        }
    }

    fn release(&self, reply: impl Fn(&str) -> Response) {
        let held: Vec<_> = self.state.lock().unwrap().held.drain(..).collect();
        for (url, tx) in held {
            let _ = tx.send(reply(&url));
        }
    }

    fn urls(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    fn kinds(&self) -> Vec<PayloadKind> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .map(|(_, kind)| *kind)
            .collect()
    }
}

impl Transport for MockTransport {
    fn fetch(&self, url: &str, kind: PayloadKind) -> BoxFuture<'static, Response> {
        let mut state = self.state.lock().unwrap();
        state.requests.push((url.to_string(), kind));
        match &self.reply {
            Some(reply) => {
                let response = reply(url);
                async move { response }.boxed()
            }
            None => {
                let (tx, rx) = oneshot::channel();
                state.held.push((url.to_string(), tx));
                rx.map(|r| r.unwrap_or(Response::Abort)).boxed()
            }
        }
    }
}

struct TestSegment {
    key: TileKey,
    relevant: Cell<bool>,
    applied: RefCell<Vec<Option<SharedGrid>>>,
    aborted: Cell<usize>,
    ancestor: Option<(TileKey, SharedGrid)>,
}

impl TestSegment {
    fn new(key: TileKey) -> Rc<Self> {
        Rc::new(Self {
            key,
            relevant: Cell::new(true),
            applied: Default::default(),
            aborted: Cell::new(0),
            ancestor: None,
        })
    }

    fn applied(&self) -> Vec<Option<SharedGrid>> {
        self.applied.borrow().clone()
    }

    fn only_grid(&self) -> SharedGrid {
        let applied = self.applied();
        assert_eq!(applied.len(), 1);
        applied[0].clone().expect("segment got no heights")
    }
}

impl Segment for TestSegment {
    fn tile_key(&self) -> TileKey {
        self.key
    }

    fn still_relevant(&self) -> bool {
        self.relevant.get()
    }

    fn apply_terrain(&self, heights: Option<SharedGrid>) {
        self.applied.borrow_mut().push(heights);
    }

    fn terrain_load_aborted(&self) {
        self.aborted.set(self.aborted.get() + 1);
    }

    fn ancestor_terrain(&self) -> Option<(TileKey, SharedGrid)> {
        self.ancestor.clone()
    }
}

fn load(provider: &dyn Terrain, segment: &Rc<TestSegment>) {
    let segment: Rc<dyn Segment> = segment.clone();
    provider.load_terrain(segment, false);
}

fn flat_ddm(height: i16) -> Response {
    Response::Ready(bytes_payload(int16_tile(64, |_, _| height)))
}

fn ddm_provider(transport: MockTransport, pool: &LocalPool) -> TerrainProvider<MockTransport, futures::executor::LocalSpawner> {
    TerrainProvider::new(ProviderConfig::preset(SourceFormat::Ddm16), transport, pool.spawner()).unwrap()
}

fn assert_flat(grid: &ElevationGrid, height: f32) {
    for &h in grid.heights() {
        assert!((h - height).abs() < 1e-3, "{} != {}", h, height);
    }
}

const TILE: TileKey = TileKey::new(10, 12, 5);

#[test]
fn loading_a_cached_tile_does_not_fetch_again() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::replying(|_| flat_ddm(100));
    let provider = ddm_provider(transport.clone(), &pool);

    let first = TestSegment::new(TILE);
    load(&provider, &first);
    pool.run_until_stalled();

    let grid = first.only_grid();
    assert_eq!(grid.grid_size(), 32);
    assert_flat(&grid, 100.0);

    let second = TestSegment::new(TILE);
    load(&provider, &second);
    assert_eq!(second.applied().len(), 1);

    assert_eq!(transport.urls(), vec!["https://a.srtm3.openglobus.org/5/12/10.ddm"]);
    assert_eq!(provider.fetch_count(), 1);
}

#[test]
fn seeded_children_are_served_from_cache() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::replying(|_| Response::Ready(bytes_payload(random_int16_tile(64, 1, 3000, 7))));
    let provider = ddm_provider(transport.clone(), &pool);

    let parent = TestSegment::new(TILE);
    load(&provider, &parent);
    pool.run_until_stalled();
    let parent_grid = parent.only_grid();

    for child in TILE.children().iter() {
        let segment = TestSegment::new(*child);
        load(&provider, &segment);
        assert_eq!(segment.only_grid().grid_size(), 32);
    }
    assert_eq!(transport.urls().len(), 1);

    // The north-west child's west border is every other vertex of the parent's west border, down to the middle.
    let north_west = provider.cache().peek(&TILE.child(0, 0)).unwrap().heights.unwrap();
    for row in 0..=16 {
        assert_eq!(north_west.get(2 * row, 0), parent_grid.get(row, 0));
    }
}

#[test]
fn concurrent_height_queries_share_one_fetch() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::holding();
    let provider = ddm_provider(transport.clone(), &pool);

    let points: Vec<LonLat> = (0..5).map(|i| LonLat::new(7.1 + 0.01 * i as f64, 46.01)).collect();
    let key = provider.point_key(points[0], Some(10));
    assert!(points.iter().all(|p| provider.point_key(*p, Some(10)) == key));

    let heights = Rc::new(RefCell::new(Vec::new()));
    for point in points.iter() {
        let heights = Rc::clone(&heights);
        let sync = provider.get_height_async(*point, Box::new(move |h| heights.borrow_mut().push(h)), Some(10));
        assert!(!sync);
    }
    pool.run_until_stalled();
    assert_eq!(transport.urls().len(), 1);

    transport.release(|_| flat_ddm(250));
    pool.run_until_stalled();

    let heights = heights.borrow().clone();
    assert_eq!(heights.len(), 5);
    for h in heights {
        assert!((h - 250.0).abs() < 1e-3);
    }

    // Now cached.
    let answered = Rc::new(Cell::new(None));
    let out = Rc::clone(&answered);
    assert!(provider.get_height_async(points[2], Box::new(move |h| out.set(Some(h))), Some(10)));
    assert!((answered.get().unwrap() - 250.0).abs() < 1e-3);
    assert_eq!(provider.fetch_count(), 1);
}

#[test]
fn point_query_and_segment_load_share_one_fetch() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::holding();
    let provider = ddm_provider(transport.clone(), &pool);

    let center = terrain_tiles_provider::tile_center_lon_lat(&TILE);
    let height = Rc::new(Cell::new(None));
    let out = Rc::clone(&height);
    provider.get_height_async(center, Box::new(move |h| out.set(Some(h))), Some(TILE.zoom));
    let segment = TestSegment::new(TILE);
    load(&provider, &segment);
    pool.run_until_stalled();

    transport.release(|_| flat_ddm(75));
    pool.run_until_stalled();

    assert_eq!(transport.urls().len(), 1);
    assert!((height.get().unwrap() - 75.0).abs() < 1e-3);
    assert_flat(&segment.only_grid(), 75.0);
}

#[test]
fn out_of_range_latitude_is_zero_right_away() {
    let pool = LocalPool::new();
    let transport = MockTransport::holding();
    let provider = ddm_provider(transport.clone(), &pool);

    let height = Rc::new(Cell::new(None));
    let out = Rc::clone(&height);
    assert!(provider.get_height_async(LonLat::new(0.0, 91.0), Box::new(move |h| out.set(Some(h))), None));
    assert_eq!(height.get(), Some(0.0));
    assert!(transport.urls().is_empty());
}

#[test]
fn height_at_resolves_points_of_a_sloped_tile() {
    let mut pool = LocalPool::new();
    // Heights rise by 10 m per raster column. The current grid keeps every other virtual column, and the middle column
    // is the mean of the two central pixels.
    let transport = MockTransport::replying(|_| Response::Ready(bytes_payload(int16_tile(64, |_, col| col as i16 * 10))));
    let provider = ddm_provider(transport, &pool);

    let extent = TILE.extent();
    let west = pool.run_until(provider.height_at(lon_lat_at(&extent, 0.25, 0.5), Some(TILE.zoom)));
    let east = pool.run_until(provider.height_at(lon_lat_at(&extent, 0.75, 0.5), Some(TILE.zoom)));

    assert!(east > west);
    assert!((west - 160.0).abs() < 0.5, "{}", west);
    assert!((east - 470.0).abs() < 0.5, "{}", east);
}

fn lon_lat_at(extent: &Extent, u: f64, v: f64) -> LonLat {
    let merc = LonLat::new(
        extent.west() + u * extent.width(),
        extent.north() - v * extent.height(),
    );
    terrain_tiles_core::mercator::inverse(merc)
}

#[test]
fn no_data_is_filled_from_cached_ancestor() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::replying(|_| flat_ddm(-9999));
    let mut config = ProviderConfig::preset(SourceFormat::Ddm16);
    config.no_data_values = vec![-9999.0];
    let provider = TerrainProvider::new(config, transport, pool.spawner()).unwrap();

    let parent = TILE.parent().unwrap();
    provider.cache().set(
        parent,
        CacheEntry::new(Some(Arc::new(ElevationGrid::filled(32, 42.0))), parent.extent()),
    );

    let segment = TestSegment::new(TILE);
    load(&provider, &segment);
    pool.run_until_stalled();

    assert_flat(&segment.only_grid(), 42.0);
}

#[test]
fn no_data_is_filled_from_segment_ancestor() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::replying(|_| flat_ddm(-9999));
    let mut config = ProviderConfig::preset(SourceFormat::Ddm16);
    config.no_data_values = vec![-9999.0];
    let provider = TerrainProvider::new(config, transport, pool.spawner()).unwrap();

    let grandparent = TILE.ancestor(3).unwrap();
    let segment = Rc::new(TestSegment {
        key: TILE,
        relevant: Cell::new(true),
        applied: Default::default(),
        aborted: Cell::new(0),
        ancestor: Some((grandparent, Arc::new(ElevationGrid::filled(16, -12.0)))),
    });
    load(&provider, &segment);
    pool.run_until_stalled();

    assert_flat(&segment.only_grid(), -12.0);
}

#[test]
fn unresolved_no_data_becomes_zero() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::replying(|_| flat_ddm(-9999));
    let mut config = ProviderConfig::preset(SourceFormat::Ddm16);
    config.no_data_values = vec![-9999.0];
    let provider = TerrainProvider::new(config, transport, pool.spawner()).unwrap();

    let segment = TestSegment::new(TILE);
    load(&provider, &segment);
    pool.run_until_stalled();

    assert_flat(&segment.only_grid(), 0.0);
}

#[test]
fn irrelevant_segment_never_gets_real_data() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::holding();
    let provider = ddm_provider(transport.clone(), &pool);

    let segment = TestSegment::new(TILE);
    load(&provider, &segment);
    pool.run_until_stalled();
    assert_eq!(transport.urls().len(), 1);

    segment.relevant.set(false);
    transport.release(|_| flat_ddm(500));
    pool.run_until_stalled();

    assert!(segment.applied().is_empty());
    assert_eq!(segment.aborted.get(), 1);
}

#[test]
fn queued_request_is_dropped_once_irrelevant() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::holding();
    let mut config = ProviderConfig::preset(SourceFormat::Ddm16);
    config.max_requests = 1;
    let provider = TerrainProvider::new(config, transport.clone(), pool.spawner()).unwrap();

    let first = TestSegment::new(TILE);
    let second = TestSegment::new(TileKey::new(11, 12, 5));
    load(&provider, &first);
    load(&provider, &second);
    assert_eq!(provider.loader().queued(), 1);

    second.relevant.set(false);
    transport.release(|_| flat_ddm(1));
    pool.run_until_stalled();

    assert_eq!(transport.urls().len(), 1);
    assert_eq!(first.applied().len(), 1);
    assert!(second.applied().is_empty());
    assert_eq!(second.aborted.get(), 1);
}

#[test]
fn abort_loading_answers_every_segment() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::holding();
    let mut config = ProviderConfig::preset(SourceFormat::Ddm16);
    config.max_requests = 1;
    let provider = TerrainProvider::new(config, transport, pool.spawner()).unwrap();

    let segments: Vec<_> = (0..3).map(|x| TestSegment::new(TileKey::new(x, 12, 5))).collect();
    for segment in segments.iter() {
        load(&provider, segment);
    }
    pool.run_until_stalled();

    provider.abort_loading();
    pool.run_until_stalled();

    for segment in segments.iter() {
        assert!(segment.applied().is_empty());
        assert_eq!(segment.aborted.get(), 1);
    }
    assert!(provider.loader().is_idle());
}

#[test]
fn transport_error_is_cached_as_missing() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::replying(|url| Response::Error(TransportError::network(url, "connection refused")));
    let provider = ddm_provider(transport.clone(), &pool);

    let segment = TestSegment::new(TILE);
    load(&provider, &segment);
    pool.run_until_stalled();
    assert_eq!(segment.applied().len(), 1);
    assert!(segment.applied()[0].is_none());
    assert_eq!(provider.cache().peek(&TILE).map(|e| e.has_heights()), Some(false));

    let again = TestSegment::new(TILE);
    load(&provider, &again);
    assert!(again.applied()[0].is_none());
    assert_eq!(transport.urls().len(), 1);
}

#[test]
fn deep_height_query_retries_at_native_zoom() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::replying(|url| {
        if url.contains("/16/") {
            Response::Error(TransportError::Status {
                url: url.to_string(),
                status: 404,
            })
        } else {
            flat_ddm(300)
        }
    });
    let provider = ddm_provider(transport.clone(), &pool);

    let point = LonLat::new(7.01, 46.01);
    let height = pool.run_until(provider.height_at(point, Some(16)));

    assert!((height - 300.0).abs() < 1e-3);
    let urls = transport.urls();
    assert_eq!(urls.len(), 2);
    assert!(urls[1].contains("/14/"));
    assert!(!provider.cache().contains(&provider.point_key(point, Some(16))));
}

#[test]
fn absurd_query_zoom_is_clamped_to_the_deepest_supported_level() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::replying(|_| flat_ddm(300));
    let provider = ddm_provider(transport.clone(), &pool);

    let point = LonLat::new(10.0, 10.0);
    assert_eq!(provider.point_key(point, Some(u8::MAX)).zoom, MAX_SUPPORTED_ZOOM);

    let height = pool.run_until(provider.height_at(point, Some(40)));
    assert!((height - 300.0).abs() < 1e-3);

    let answered = Rc::new(Cell::new(None));
    let out = Rc::clone(&answered);
    assert!(provider.get_height_async(point, Box::new(move |h| out.set(Some(h))), Some(64)));
    assert!((answered.get().unwrap() - 300.0).abs() < 1e-3);

    let urls = transport.urls();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].contains(&format!("/{}/", MAX_SUPPORTED_ZOOM)));
}

#[test]
fn second_failure_resolves_to_zero() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::replying(|url| Response::Error(TransportError::network(url, "down")));
    let provider = ddm_provider(transport.clone(), &pool);

    let point = LonLat::new(7.01, 46.01);
    let height = pool.run_until(provider.height_at(point, Some(16)));

    assert_eq!(height, 0.0);
    assert_eq!(transport.urls().len(), 2);
    let native = provider.point_key(point, Some(14));
    assert_eq!(provider.cache().peek(&native).map(|e| e.has_heights()), Some(false));
}

#[test]
fn evicted_tile_decodes_to_the_same_grid() {
    let mut pool = LocalPool::new();
    let transport =
        MockTransport::replying(|url| Response::Ready(bytes_payload(random_int16_tile(64, -50, 3000, url.len() as u64))));
    let mut config = ProviderConfig::preset(SourceFormat::Ddm16);
    config.max_cached_tiles = Some(5);
    let provider = TerrainProvider::new(config, transport.clone(), pool.spawner()).unwrap();

    let first = TestSegment::new(TILE);
    load(&provider, &first);
    pool.run_until_stalled();

    let other = TestSegment::new(TileKey::new(20, 3, 5));
    load(&provider, &other);
    pool.run_until_stalled();
    assert!(!provider.cache().contains(&TILE));
    assert_eq!(provider.cache().len(), 5);

    let again = TestSegment::new(TILE);
    load(&provider, &again);
    pool.run_until_stalled();

    assert_eq!(transport.urls().len(), 3);
    assert_eq!(first.only_grid().heights(), again.only_grid().heights());
}

#[test]
fn clear_cache_forces_a_new_fetch() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::replying(|_| flat_ddm(5));
    let provider = ddm_provider(transport.clone(), &pool);

    load(&provider, &TestSegment::new(TILE));
    pool.run_until_stalled();
    provider.clear_cache();
    assert!(provider.cache().is_empty());

    load(&provider, &TestSegment::new(TILE));
    pool.run_until_stalled();
    assert_eq!(transport.urls().len(), 2);
}

#[test]
fn mapbox_tiles_are_requested_as_images() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::replying(|_| Response::Ready(image_payload(rgb_tile(256, |_, _| 1234.0))));
    let config = ProviderConfig::preset(SourceFormat::MapboxRgb).with_api_key("secret");
    let provider = TerrainProvider::new(config, transport.clone(), pool.spawner()).unwrap();

    let segment = TestSegment::new(TILE);
    load(&provider, &segment);
    pool.run_until_stalled();

    let grid = segment.only_grid();
    assert_eq!(grid.grid_size(), 128);
    assert_flat(&grid, 1234.0);
    assert_eq!(transport.kinds(), vec![PayloadKind::Image]);
    assert_eq!(
        transport.urls(),
        vec![MAPBOX_URL.replace("{z}/{x}/{y}", "5/10/12").replace("{key}", "secret")]
    );
}

#[test]
fn bil16_requests_a_wms_map() {
    let pool = LocalPool::new();
    let config = ProviderConfig::preset(SourceFormat::Bil16)
        .with_url("https://wms.example/service")
        .with_wms_layers("srtm");
    let provider = TerrainProvider::new(config, MockTransport::holding(), pool.spawner()).unwrap();

    let extent = TILE.extent();
    let url = provider.segment_url(&TILE, &extent);
    assert_eq!(
        url,
        format!(
            "https://wms.example/service/?LAYERS=srtm&FORMAT=application/bil16&SERVICE=WMS&VERSION=1.1.1\
             &REQUEST=GetMap&SRS=EPSG:3857&BBOX={}&WIDTH=256&HEIGHT=256",
            extent.to_bbox_string()
        )
    );
    assert_eq!(provider.plain_grid_size(), 128);
}

#[test]
fn url_rewrite_replaces_segment_urls() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::replying(|_| flat_ddm(1));
    let provider = ddm_provider(transport.clone(), &pool);
    let rewrite: UrlRewrite = Arc::new(|key: &TileKey, _url: &str| {
        if key.zoom == 5 {
            Some(format!("https://mirror.example/{}", key))
        } else {
            None
        }
    });
    provider.set_url_rewrite(Some(rewrite));

    load(&provider, &TestSegment::new(TILE));
    pool.run_until_stalled();
    assert_eq!(transport.urls(), vec!["https://mirror.example/10_12_5_0"]);

    provider.set_url("https://other.example/{z}/{x}/{y}.ddm");
    let child = TILE.child(1, 1).child(0, 0);
    assert_eq!(
        provider.segment_url(&child, &child.extent()),
        "https://other.example/7/42/50.ddm"
    );
}

#[test]
fn segments_outside_coverage_are_not_fetched() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::replying(|_| flat_ddm(1));
    let mut config = ProviderConfig::preset(SourceFormat::Ddm16);
    config.extent = Extent::new(LonLat::new(0.0, 30.0), LonLat::new(40.0, 70.0));
    let provider = TerrainProvider::new(config, transport.clone(), pool.spawner()).unwrap();

    // Tile (2, 5, 4) lies in the Americas.
    let outside = TestSegment::new(TileKey::new(2, 5, 4));
    load(&provider, &outside);
    pool.run_until_stalled();

    assert_eq!(outside.applied().len(), 1);
    assert!(outside.applied()[0].is_none());
    assert!(transport.urls().is_empty());
}

#[test]
fn listeners_see_grids_and_loadend() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::replying(|_| flat_ddm(9));
    let provider = ddm_provider(transport, &pool);

    let loaded = Rc::new(RefCell::new(Vec::new()));
    let loaded_in_listener = Rc::clone(&loaded);
    provider.on_load(move |key, tile| {
        loaded_in_listener
            .borrow_mut()
            .push((*key, tile.map(|t| t.extent)));
    });
    let loadends = Rc::new(Cell::new(0));
    let loadends_in_listener = Rc::clone(&loadends);
    provider.on_loadend(move || loadends_in_listener.set(loadends_in_listener.get() + 1));

    load(&provider, &TestSegment::new(TILE));
    pool.run_until_stalled();

    assert_eq!(*loaded.borrow(), vec![(TILE, Some(TILE.extent()))]);
    assert_eq!(loadends.get(), 1);
}

#[test]
fn providers_and_empty_terrain_share_one_interface() {
    let pool = LocalPool::new();
    let provider = ddm_provider(MockTransport::holding(), &pool);
    provider.set_max_node_zoom(100);

    let terrains: Vec<Box<dyn Terrain>> = vec![Box::new(provider), Box::new(EmptyTerrain::new())];

    assert!(!terrains[0].is_empty());
    assert_eq!(terrains[0].name(), "openglobus");
    assert_eq!(terrains[0].max_node_zoom(), 23);
    assert_eq!(terrains[0].grid_size_for_zoom(3), 16);
    assert!(terrains[0].is_blur(6));

    assert!(terrains[1].is_empty());
    let segment = TestSegment::new(TILE);
    load(terrains[1].as_ref(), &segment);
    assert!(segment.applied()[0].is_none());
}

#[test]
fn payload_kind_mismatch_is_cached_as_missing() {
    let mut pool = LocalPool::new();
    let transport = MockTransport::replying(|_| Response::Ready(Payload::from(rgb_tile(4, |_, _| 0.0))));
    let provider = ddm_provider(transport, &pool);

    let segment = TestSegment::new(TILE);
    load(&provider, &segment);
    pool.run_until_stalled();

    assert!(segment.applied()[0].is_none());
    assert_eq!(provider.cache().peek(&TILE).map(|e| e.has_heights()), Some(false));
}
