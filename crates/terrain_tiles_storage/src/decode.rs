//! Turning transport payloads into per-pixel height rasters.
//!
//! Two raw encodings are supported:
//!
//! - little-endian signed 16-bit integer samples, where the height is `sample * height_factor`
//! - RGBA images, where the height is `height_factor * (-10000 + 0.1 * (R * 65536 + G * 256 + B))`

use terrain_tiles_core::exact_square_side;

use image::RgbaImage;
use std::sync::Arc;
use thiserror::Error;

/// The raw body of a tile response.
#[derive(Clone, Debug)]
pub enum Payload {
    Bytes(Arc<Vec<u8>>),
    Image(Arc<RgbaImage>),
}

/// What a transport should deliver for a request.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PayloadKind {
    /// Undecoded bytes, e.g. an int16 buffer.
    Bytes,
    /// A decoded RGBA image. Transports may deliver encoded image bytes instead; they are decoded here.
    Image,
}

impl Payload {
    #[inline]
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Bytes(_) => PayloadKind::Bytes,
            Payload::Image(_) => PayloadKind::Image,
        }
    }

    #[inline]
    pub fn len_bytes(&self) -> usize {
        match self {
            Payload::Bytes(b) => b.len(),
            Payload::Image(img) => img.as_raw().len(),
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(Arc::new(bytes))
    }
}

impl From<RgbaImage> for Payload {
    fn from(image: RgbaImage) -> Self {
        Payload::Image(Arc::new(image))
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is empty")]
    Empty,
    #[error("payload of {0} bytes is not a whole number of 16-bit samples")]
    OddByteCount(usize),
    #[error("raster of {0} samples is not square")]
    NotSquare(usize),
    #[error("image of {width}x{height} pixels is not square")]
    NonSquareImage { width: u32, height: u32 },
    #[error("expected a {expected:?} payload")]
    UnexpectedPayload { expected: PayloadKind },
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}

/// A square raster of heights, one per source pixel, row-major from the north-west corner.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedRaster {
    side: usize,
    heights: Vec<f32>,
}

impl DecodedRaster {
    /// Wraps `heights`, which must hold a non-zero square number of samples.
    pub fn new(heights: Vec<f32>) -> Result<Self, DecodeError> {
        if heights.is_empty() {
            return Err(DecodeError::Empty);
        }
        let side = exact_square_side(heights.len()).ok_or(DecodeError::NotSquare(heights.len()))?;

        Ok(Self { side, heights })
    }

    /// Pixels per row (and per column).
    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    #[inline]
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    #[inline]
    pub fn into_heights(self) -> Vec<f32> {
        self.heights
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.heights[row * self.side + col]
    }
}

/// Decodes little-endian int16 samples.
pub fn decode_int16(bytes: &[u8], height_factor: f32) -> Result<DecodedRaster, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::OddByteCount(bytes.len()));
    }

    let mut samples = vec![0i16; bytes.len() / 2];
    bytemuck::cast_slice_mut::<i16, u8>(&mut samples).copy_from_slice(bytes);

    DecodedRaster::new(
        samples
            .into_iter()
            .map(|s| f32::from(i16::from_le(s)) * height_factor)
            .collect(),
    )
}

/// The lowest height the RGB encoding can express, reached by pixel `(0, 0, 0)`.
pub const RGB_BASE_HEIGHT: f32 = -10000.0;

/// Height of one RGB pixel before scaling.
#[inline]
pub fn rgb_to_height(r: u8, g: u8, b: u8) -> f32 {
    let packed = f64::from(r) * 65536.0 + f64::from(g) * 256.0 + f64::from(b);
    (f64::from(RGB_BASE_HEIGHT) + 0.1 * packed) as f32
}

/// Decodes an RGBA image. With `red_is_no_data`, fully red pixels (`R == 255`) decode to the base height so they hit the
/// no-data table.
pub fn decode_rgb(
    image: &RgbaImage,
    height_factor: f32,
    red_is_no_data: bool,
) -> Result<DecodedRaster, DecodeError> {
    let (width, height) = image.dimensions();
    if width != height {
        return Err(DecodeError::NonSquareImage { width, height });
    }

    let heights = image
        .pixels()
        .map(|p| {
            let [r, g, b, _] = p.0;
            if red_is_no_data && r == 255 {
                RGB_BASE_HEIGHT * height_factor
            } else {
                rgb_to_height(r, g, b) * height_factor
            }
        })
        .collect();

    DecodedRaster::new(heights)
}

/// Accepts either a decoded image or encoded image bytes.
pub fn decode_rgb_payload(
    payload: &Payload,
    height_factor: f32,
    red_is_no_data: bool,
) -> Result<DecodedRaster, DecodeError> {
    match payload {
        Payload::Image(image) => decode_rgb(image, height_factor, red_is_no_data),
        Payload::Bytes(bytes) => {
            if bytes.is_empty() {
                return Err(DecodeError::Empty);
            }
            let image = image::load_from_memory(bytes)?.to_rgba8();
            decode_rgb(&image, height_factor, red_is_no_data)
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    use image::Rgba;

    fn int16_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes().to_vec()).collect()
    }

    #[test]
    fn int16_samples_are_scaled() {
        let bytes = int16_bytes(&[1, -2, 300, -9999]);
        let raster = decode_int16(&bytes, 2.0).unwrap();
        assert_eq!(raster.side(), 2);
        assert_eq!(raster.heights(), &[2.0, -4.0, 600.0, -19998.0]);
    }

    #[test]
    fn int16_rejects_bad_lengths() {
        assert!(matches!(decode_int16(&[], 1.0), Err(DecodeError::Empty)));
        assert!(matches!(
            decode_int16(&[0, 0, 0], 1.0),
            Err(DecodeError::OddByteCount(3))
        ));
        assert!(matches!(
            decode_int16(&int16_bytes(&[0, 0, 0]), 1.0),
            Err(DecodeError::NotSquare(3))
        ));
    }

    #[test]
    fn rgb_formula() {
        assert_eq!(rgb_to_height(0, 0, 0), -10000.0);
        assert_eq!(rgb_to_height(1, 134, 160), 0.0);
        assert_eq!(rgb_to_height(1, 134, 170), 1.0);
    }

    #[test]
    fn red_pixels_become_base_height() {
        let mut image = RgbaImage::new(2, 2);
        image.put_pixel(0, 0, Rgba([255, 10, 10, 255]));
        image.put_pixel(1, 0, Rgba([1, 134, 170, 255]));

        let raster = decode_rgb(&image, 1.0, true).unwrap();
        assert_eq!(raster.get(0, 0), -10000.0);
        assert_eq!(raster.get(0, 1), 1.0);
        assert_eq!(raster.get(1, 1), -10000.0);

        let raster = decode_rgb(&image, 1.0, false).unwrap();
        assert!(raster.get(0, 0) > 1_000_000.0);
    }

    #[test]
    fn non_square_image_is_rejected() {
        let image = RgbaImage::new(4, 2);
        assert!(matches!(
            decode_rgb(&image, 1.0, false),
            Err(DecodeError::NonSquareImage {
                width: 4,
                height: 2
            })
        ));
    }

    #[test]
    fn garbage_image_bytes_fail() {
        let payload = Payload::from(vec![1, 2, 3, 4]);
        assert!(matches!(
            decode_rgb_payload(&payload, 1.0, false),
            Err(DecodeError::Image(_))
        ));
    }
}
