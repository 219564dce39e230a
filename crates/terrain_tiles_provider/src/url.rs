use terrain_tiles_core::{Extent, TileKey};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Rewrites the request URL for a tile. Returning `None` keeps the URL built from the template.
pub type UrlRewrite = Arc<dyn Fn(&TileKey, &str) -> Option<String> + Send + Sync>;

pub const BIL16_MIME: &str = "application/bil16";
pub const WMS_VERSION: &str = "1.1.1";
pub const WEB_MERCATOR_SRS: &str = "EPSG:3857";

/// An XYZ URL template with `{s}`, `{x}`, `{y}`, `{z}` and `{key}` placeholders.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UrlTemplate {
    template: String,
}

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn uses_subdomain(&self) -> bool {
        self.template.contains("{s}")
    }

    pub fn expand(&self, key: &TileKey, subdomain: &str, api_key: Option<&str>) -> String {
        self.template
            .replace("{s}", subdomain)
            .replace("{x}", &key.x.to_string())
            .replace("{y}", &key.y.to_string())
            .replace("{z}", &key.zoom.to_string())
            .replace("{key}", api_key.unwrap_or(""))
    }
}

/// Round-robin over CDN subdomains, `per_subdomain` consecutive requests per subdomain.
#[derive(Debug)]
pub struct SubdomainRotation {
    subdomains: Vec<String>,
    per_subdomain: usize,
    count: AtomicUsize,
}

impl SubdomainRotation {
    pub fn new(subdomains: Vec<String>, per_subdomain: usize) -> Self {
        Self {
            subdomains,
            per_subdomain: per_subdomain.max(1),
            count: AtomicUsize::new(0),
        }
    }

    /// The subdomain for the next request, or `""` when none are configured.
    pub fn next(&self) -> &str {
        if self.subdomains.is_empty() {
            return "";
        }
        let period = self.per_subdomain * self.subdomains.len();
        let count = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        &self.subdomains[(count % period) / self.per_subdomain]
    }
}

/// A WMS 1.1.1 `GetMap` request for `extent` (projected meters) as an `application/bil16` raster of `image_size` pixels.
pub fn wms_bil16_url(base: &str, layers: &str, extent: &Extent, image_size: usize) -> String {
    format!(
        "{}/?LAYERS={}&FORMAT={}&SERVICE=WMS&VERSION={}&REQUEST=GetMap&SRS={}&BBOX={}&WIDTH={}&HEIGHT={}",
        base,
        layers,
        BIL16_MIME,
        WMS_VERSION,
        WEB_MERCATOR_SRS,
        extent.to_bbox_string(),
        image_size,
        image_size
    )
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
