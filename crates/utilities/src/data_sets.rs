//! Synthetic elevation tiles in the wire formats served by tile sources.

use terrain_tiles_storage::Payload;

use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::io::Cursor;

/// Little-endian int16 samples, as served by `.ddm` and `bil16` endpoints.
pub fn int16_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes().to_vec()).collect()
}

/// `side × side` int16 samples produced by `f(row, col)`.
pub fn int16_tile(side: usize, mut f: impl FnMut(usize, usize) -> i16) -> Vec<u8> {
    let mut samples = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            samples.push(f(row, col));
        }
    }

    int16_bytes(&samples)
}

/// Uniformly random int16 samples in `min..max`, reproducible by `seed`.
pub fn random_int16_tile(side: usize, min: i16, max: i16, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    int16_tile(side, |_, _| rng.gen_range(min..max))
}

/// The RGB pixel whose decoded height is closest to `height` meters.
pub fn encode_rgb_height(height: f32) -> [u8; 3] {
    let packed = ((f64::from(height) + 10000.0) * 10.0).round().max(0.0).min(16_777_215.0) as u32;

    [(packed >> 16) as u8, (packed >> 8) as u8, packed as u8]
}

/// An RGB-encoded tile whose pixel `(row, col)` decodes to `f(row, col)`.
pub fn rgb_tile(side: u32, mut f: impl FnMut(u32, u32) -> f32) -> RgbaImage {
    RgbaImage::from_fn(side, side, |col, row| {
        let [r, g, b] = encode_rgb_height(f(row, col));
        Rgba([r, g, b, 255])
    })
}

/// PNG file bytes for `image`.
pub fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut bytes, ImageOutputFormat::Png)
        .unwrap();

    bytes.into_inner()
}

pub fn bytes_payload(bytes: Vec<u8>) -> Payload {
    Payload::from(bytes)
}

pub fn image_payload(image: RgbaImage) -> Payload {
    Payload::from(image)
}
