//! Provider configuration.
//!
//! Every field has a default, so a configuration file only needs to name what differs from the preset of its format.
//!
//! ```
//! use terrain_tiles_provider::ProviderConfig;
//! use terrain_tiles_storage::SourceFormat;
//!
//! let config = ProviderConfig::preset(SourceFormat::MapboxRgb).with_api_key("secret");
//! assert_eq!(config.plain_grid_size, 128);
//! assert!(config.validate().is_ok());
//! ```

use terrain_tiles_core::{is_power_of_two, next_power_of_two, Extent};
use terrain_tiles_storage::SourceFormat;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deepest zoom whose tile coordinates fit the key type.
pub const MAX_SUPPORTED_ZOOM: u8 = 30;

pub const DDM_URL: &str = "https://{s}.srtm3.openglobus.org/{z}/{y}/{x}.ddm";
pub const MAPBOX_URL: &str = "https://api.mapbox.com/v4/mapbox.terrain-rgb/{z}/{x}/{y}.pngraw?access_token={key}";

const DDM_GRID_SIZE_BY_ZOOM: [usize; 24] = [
    64, 32, 32, 16, 16, 8, 8, 8, 16, 16, 16, 32, 32, 32, 32, 16, 8, 4, 2, 2, 2, 2, 2, 2,
];
const MAPBOX_GRID_SIZE_BY_ZOOM: [usize; 22] = [
    64, 32, 16, 8, 8, 8, 8, 16, 16, 16, 16, 16, 32, 16, 32, 16, 32, 16, 32, 16, 8, 4,
];
const RGB_GRID_SIZE_BY_ZOOM: [usize; 22] = [
    64, 32, 16, 8, 8, 8, 16, 16, 16, 32, 32, 32, 32, 32, 32, 64, 64, 64, 32, 32, 16, 8,
];
pub(crate) const EMPTY_GRID_SIZE_BY_ZOOM: [usize; 26] = [
    64, 32, 16, 8, 4, 4, 4, 4, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
];

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: String,
    pub format: SourceFormat,
    /// URL template with `{s}`, `{x}`, `{y}`, `{z}` and `{key}` placeholders. For `Bil16` this is the WMS base URL.
    pub url: String,
    /// Substituted for `{key}`.
    pub api_key: Option<String>,
    pub subdomains: Vec<String>,
    pub requests_per_subdomain: usize,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Deepest zoom with real source data; deeper requests that fail are retried here.
    pub max_native_zoom: u8,
    /// Triangulation size used by the renderer at each zoom.
    pub grid_size_by_zoom: Vec<usize>,
    /// Unscaled sentinel heights. `GenericRgb` always adds the base height its masked pixels decode to.
    pub no_data_values: Vec<f32>,
    pub height_factor: f32,
    /// Cells per side of the grids handed to segments. Must be a power of two.
    pub plain_grid_size: usize,
    /// Expected raster side. Decoders always use the side of the actual payload.
    pub image_size: usize,
    /// Geographic coverage in degrees; segments outside are not requested.
    pub extent: Extent,
    pub max_requests: usize,
    /// `None` keeps every decoded tile.
    pub max_cached_tiles: Option<usize>,
    pub wms_layers: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::preset(SourceFormat::Ddm16)
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("plain grid size {0} is not a power of two")]
    GridSizeNotPowerOfTwo(usize),
    #[error("grid size by zoom must not be empty")]
    EmptyGridSizeByZoom,
    #[error("url uses {{s}} but no subdomains are configured")]
    NoSubdomains,
    #[error("requests per subdomain must be positive")]
    ZeroRequestsPerSubdomain,
    #[error("max native zoom {native} is deeper than max zoom {max}")]
    NativeZoomAboveMax { native: u8, max: u8 },
    #[error("zoom {0} is deeper than the supported {}", MAX_SUPPORTED_ZOOM)]
    ZoomTooDeep(u8),
    #[error("max requests must be positive")]
    ZeroMaxRequests,
    #[error("height factor {0} must be finite and non-zero")]
    InvalidHeightFactor(f32),
}

impl ProviderConfig {
    /// The reference defaults for `format`.
    pub fn preset(format: SourceFormat) -> Self {
        let base = Self {
            name: String::new(),
            format,
            url: String::new(),
            api_key: None,
            subdomains: vec!["a".into(), "b".into(), "c".into()],
            requests_per_subdomain: 4,
            min_zoom: 2,
            max_zoom: 14,
            max_native_zoom: 14,
            grid_size_by_zoom: DDM_GRID_SIZE_BY_ZOOM.to_vec(),
            no_data_values: format.default_no_data_values().to_vec(),
            height_factor: 1.0,
            plain_grid_size: 32,
            image_size: 32,
            extent: Extent::WORLD,
            max_requests: crate::MAX_REQUESTS,
            max_cached_tiles: None,
            wms_layers: String::new(),
        };

        match format {
            SourceFormat::Ddm16 => Self {
                name: "openglobus".into(),
                url: DDM_URL.into(),
                ..base
            },
            SourceFormat::Bil16 => {
                let image_size = 256;
                Self {
                    name: "BilTerrain".into(),
                    plain_grid_size: bil_plain_grid_size(image_size),
                    image_size,
                    ..base
                }
            }
            SourceFormat::MapboxRgb => Self {
                name: "MapboxTerrain".into(),
                url: MAPBOX_URL.into(),
                max_zoom: 17,
                grid_size_by_zoom: MAPBOX_GRID_SIZE_BY_ZOOM.to_vec(),
                plain_grid_size: 128,
                image_size: 256,
                ..base
            },
            SourceFormat::GenericRgb => Self {
                name: "RgbTerrain".into(),
                url: MAPBOX_URL.into(),
                max_zoom: 17,
                grid_size_by_zoom: RGB_GRID_SIZE_BY_ZOOM.to_vec(),
                plain_grid_size: 128,
                image_size: 256,
                ..base
            },
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_wms_layers(mut self, layers: impl Into<String>) -> Self {
        self.wms_layers = layers.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_power_of_two(self.plain_grid_size) {
            return Err(ConfigError::GridSizeNotPowerOfTwo(self.plain_grid_size));
        }
        if self.grid_size_by_zoom.is_empty() {
            return Err(ConfigError::EmptyGridSizeByZoom);
        }
        if self.url.contains("{s}") && self.subdomains.is_empty() {
            return Err(ConfigError::NoSubdomains);
        }
        if self.requests_per_subdomain == 0 {
            return Err(ConfigError::ZeroRequestsPerSubdomain);
        }
        if self.max_zoom > MAX_SUPPORTED_ZOOM {
            return Err(ConfigError::ZoomTooDeep(self.max_zoom));
        }
        if self.max_native_zoom > self.max_zoom {
            return Err(ConfigError::NativeZoomAboveMax {
                native: self.max_native_zoom,
                max: self.max_zoom,
            });
        }
        if self.max_requests == 0 {
            return Err(ConfigError::ZeroMaxRequests);
        }
        if !self.height_factor.is_finite() || self.height_factor == 0.0 {
            return Err(ConfigError::InvalidHeightFactor(self.height_factor));
        }

        Ok(())
    }
}

/// Half the image size, rounded up to a power of two first.
pub fn bil_plain_grid_size(image_size: usize) -> usize {
    (next_power_of_two(image_size) / 2).max(1)
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
