#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A longitude/latitude pair.
///
/// Depending on context the components are either geographic degrees or web-mercator meters (see `mercator::forward`). Grid
/// extents are always stored in mercator meters, while callers usually hand in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    #[inline]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<(f64, f64)> for LonLat {
    #[inline]
    fn from((lon, lat): (f64, f64)) -> Self {
        Self::new(lon, lat)
    }
}
