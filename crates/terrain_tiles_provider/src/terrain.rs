use crate::{config::EMPTY_GRID_SIZE_BY_ZOOM, Segment};

use terrain_tiles_core::LonLat;

use std::rc::Rc;

/// Receives the height for a point query.
pub type HeightCallback = Box<dyn FnOnce(f32)>;

/// What the renderer needs from an elevation source.
///
/// The trait is object safe so a globe can swap between a real provider and `EmptyTerrain` at runtime.
pub trait Terrain {
    fn name(&self) -> &str;

    /// `true` for sources that never produce elevations.
    fn is_empty(&self) -> bool;

    /// Hands `segment` its grid, from the cache or after a fetch. With `force_loading` the fetch happens even if the
    /// segment stops being relevant.
    fn load_terrain(&self, segment: Rc<dyn Segment>, force_loading: bool);

    /// Resolves the ground height at `lon_lat` (degrees). Returns `true` if `callback` already ran, `false` if it will run
    /// once the tile arrives. `zoom` defaults to the deepest zoom of the source.
    fn get_height_async(&self, lon_lat: LonLat, callback: HeightCallback, zoom: Option<u8>) -> bool;

    fn clear_cache(&self);

    fn abort_loading(&self);

    fn is_blur(&self, zoom: u8) -> bool;

    /// Triangulation size the renderer should use at `zoom`.
    fn grid_size_for_zoom(&self, zoom: u8) -> usize;

    /// Cells per side of the grids handed to segments.
    fn plain_grid_size(&self) -> usize;

    fn min_zoom(&self) -> u8;

    fn max_zoom(&self) -> u8;

    /// Deepest zoom the renderer may subdivide to.
    fn max_node_zoom(&self) -> u8;
}

pub(crate) fn grid_size_at(grid_size_by_zoom: &[usize], zoom: u8) -> usize {
    let last = grid_size_by_zoom.len().saturating_sub(1);
    grid_size_by_zoom
        .get(usize::from(zoom).min(last))
        .copied()
        .unwrap_or(1)
}

pub(crate) fn clamp_node_zoom(grid_size_by_zoom: &[usize], zoom: u8) -> u8 {
    let last = grid_size_by_zoom.len().saturating_sub(1);
    zoom.min(last.min(usize::from(u8::MAX)) as u8)
}

/// A flat world at height zero.
#[derive(Clone, Debug)]
pub struct EmptyTerrain {
    name: String,
    min_zoom: u8,
    max_zoom: u8,
    grid_size_by_zoom: Vec<usize>,
    max_node_zoom: u8,
}

impl Default for EmptyTerrain {
    fn default() -> Self {
        Self::new()
    }
}

impl EmptyTerrain {
    pub const PLAIN_GRID_SIZE: usize = 2;

    pub fn new() -> Self {
        Self::with_grid_sizes(EMPTY_GRID_SIZE_BY_ZOOM.to_vec())
    }

    pub fn with_grid_sizes(grid_size_by_zoom: Vec<usize>) -> Self {
        let max_node_zoom = clamp_node_zoom(&grid_size_by_zoom, u8::MAX);
        Self {
            name: "empty".into(),
            min_zoom: 2,
            max_zoom: 50,
            grid_size_by_zoom,
            max_node_zoom,
        }
    }

    /// Clamped to the deepest zoom that has a grid size.
    pub fn set_max_node_zoom(&mut self, zoom: u8) {
        self.max_node_zoom = clamp_node_zoom(&self.grid_size_by_zoom, zoom);
    }
}

impl Terrain for EmptyTerrain {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_empty(&self) -> bool {
        true
    }

    fn load_terrain(&self, segment: Rc<dyn Segment>, _force_loading: bool) {
        segment.elevations_not_exist();
    }

    fn get_height_async(&self, _lon_lat: LonLat, callback: HeightCallback, _zoom: Option<u8>) -> bool {
        callback(0.0);
        true
    }

    fn clear_cache(&self) {}

    fn abort_loading(&self) {}

    fn is_blur(&self, _zoom: u8) -> bool {
        false
    }

    fn grid_size_for_zoom(&self, zoom: u8) -> usize {
        grid_size_at(&self.grid_size_by_zoom, zoom)
    }

    fn plain_grid_size(&self) -> usize {
        Self::PLAIN_GRID_SIZE
    }

    fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    fn max_node_zoom(&self) -> u8 {
        self.max_node_zoom
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
