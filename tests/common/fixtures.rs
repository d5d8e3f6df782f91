//! Image fixtures and test content generators

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

/// RGB test pattern with distinct values per pixel
pub fn rgb_pattern(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    }))
}

/// RGBA test pattern with a varying alpha channel
pub fn rgba_pattern(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 3 % 256) as u8, (y * 5 % 256) as u8, 77, ((x + y) % 256) as u8])
    }))
}

/// Encode `image` in `format`
pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, format)
        .expect("Failed to encode fixture");
    buf.into_inner()
}

/// 300x200 JPEG, the canonical "cat.jpg"
pub fn cat_jpeg() -> Vec<u8> {
    encode(&rgb_pattern(300, 200), ImageFormat::Jpeg)
}

/// Bytes that no image decoder accepts
pub const NOT_AN_IMAGE: &[u8] =
    b"<!doctype html><html><body>404 but with status 200</body></html>";
