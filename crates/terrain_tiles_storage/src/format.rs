use crate::{
    decode_int16, decode_rgb_payload, DecodeError, DecodedRaster, FallbackPolicy, NoDataRule, Payload, PayloadKind,
    RGB_BASE_HEIGHT,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// RGB-encoded heights above this value (before scaling) are treated as no data.
pub const RGB_NO_DATA_THRESHOLD: f32 = 50000.0;

/// The raster encodings served by elevation tile sources.
///
/// Each variant knows how to decode its payload, which heights it treats as "no data" and how it fills gaps from ancestors.
/// Everything else about fetching and resampling is shared.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SourceFormat {
    /// Raw little-endian int16 tiles (`.ddm`) from an XYZ template.
    Ddm16,
    /// Raw little-endian int16 tiles (`application/bil16`) from a WMS `GetMap` endpoint.
    Bil16,
    /// RGB-encoded PNG tiles.
    MapboxRgb,
    /// RGB-encoded PNG tiles where fully red pixels mark missing data and coarse ancestors are not trusted above sea level.
    GenericRgb,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 4] = [
        SourceFormat::Ddm16,
        SourceFormat::Bil16,
        SourceFormat::MapboxRgb,
        SourceFormat::GenericRgb,
    ];

    #[inline]
    pub fn payload_kind(self) -> PayloadKind {
        match self {
            SourceFormat::Ddm16 | SourceFormat::Bil16 => PayloadKind::Bytes,
            SourceFormat::MapboxRgb | SourceFormat::GenericRgb => PayloadKind::Image,
        }
    }

    pub fn decode(self, payload: &Payload, height_factor: f32) -> Result<DecodedRaster, DecodeError> {
        match self {
            SourceFormat::Ddm16 | SourceFormat::Bil16 => match payload {
                Payload::Bytes(bytes) => decode_int16(bytes, height_factor),
                Payload::Image(_) => Err(DecodeError::UnexpectedPayload {
                    expected: PayloadKind::Bytes,
                }),
            },
            SourceFormat::MapboxRgb => decode_rgb_payload(payload, height_factor, false),
            SourceFormat::GenericRgb => decode_rgb_payload(payload, height_factor, true),
        }
    }

    /// Sentinels used when the configuration does not name any.
    pub fn default_no_data_values(self) -> &'static [f32] {
        match self {
            SourceFormat::Ddm16 => &[],
            SourceFormat::Bil16 => &[-9999.0, 32767.0],
            SourceFormat::MapboxRgb | SourceFormat::GenericRgb => &[-65537.0, -10000.0],
        }
    }

    /// The no-data rule for `sentinels`, scaled by `height_factor`. RGB formats also flag implausibly high values.
    pub fn no_data_rule(self, sentinels: &[f32], height_factor: f32) -> NoDataRule {
        match self {
            SourceFormat::Ddm16 | SourceFormat::Bil16 => NoDataRule::new(sentinels, height_factor),
            SourceFormat::MapboxRgb => {
                NoDataRule::new(sentinels, height_factor).with_threshold(RGB_NO_DATA_THRESHOLD, height_factor)
            }
            SourceFormat::GenericRgb => {
                // Masked red pixels decode to the base height, whatever table is configured.
                let mut table = sentinels.to_vec();
                table.push(RGB_BASE_HEIGHT);
                NoDataRule::new(&table, height_factor).with_threshold(RGB_NO_DATA_THRESHOLD, height_factor)
            }
        }
    }

    #[inline]
    pub fn fallback_policy(self) -> FallbackPolicy {
        match self {
            SourceFormat::GenericRgb => FallbackPolicy::AncestorSeaLevelClamped,
            _ => FallbackPolicy::Ancestor,
        }
    }

    /// Whether tile keys carry a polar group derived from the queried latitude.
    #[inline]
    pub fn uses_tile_groups(self) -> bool {
        matches!(self, SourceFormat::Ddm16 | SourceFormat::GenericRgb)
    }

    /// The zoom from which rendered terrain of this format is smooth enough to be blurred.
    #[inline]
    pub fn blur_zoom(self) -> u8 {
        match self {
            SourceFormat::Ddm16 => 6,
            SourceFormat::Bil16 => 18,
            SourceFormat::MapboxRgb | SourceFormat::GenericRgb => 16,
        }
    }

    #[inline]
    pub fn is_blur(self, zoom: u8) -> bool {
        zoom >= self.blur_zoom()
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
