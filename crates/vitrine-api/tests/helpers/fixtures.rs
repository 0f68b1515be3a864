//! Test fixtures: images built in memory.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};
use std::io::Cursor;

/// Deterministic pseudo-random pixels; they compress poorly, which keeps
/// fixture sizes predictable.
fn noise_rgb(width: u32, height: u32) -> RgbImage {
    let mut state: u32 = 0x2545_f491;
    RgbImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        Rgb([r, g, b])
    })
}

/// High-quality JPEG of noise.
pub fn create_noise_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 95)
        .encode_image(&DynamicImage::ImageRgb8(noise_rgb(width, height)))
        .expect("Failed to encode JPEG fixture");
    buf
}

/// Opaque PNG of a flat colour.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([40, 120, 200]));
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Png)
}

/// PNG of noise whose left half is transparent.
pub fn create_transparent_png(width: u32, height: u32) -> Vec<u8> {
    let noise = noise_rgb(width, height);
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let Rgb([r, g, b]) = *noise.get_pixel(x, y);
        Rgba([r, g, b, if x < width / 2 { 0 } else { 255 }])
    });
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

/// Tag a JPEG with an EXIF orientation value.
pub fn with_exif_orientation(jpeg: Vec<u8>, orientation: u16) -> Vec<u8> {
    // Big-endian TIFF header, one IFD entry: Orientation (0x0112), SHORT, count 1
    let mut exif = vec![b'M', b'M', 0x00, 0x2a, 0x00, 0x00, 0x00, 0x08, 0x00, 0x01];
    exif.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
    exif.extend_from_slice(&orientation.to_be_bytes());
    exif.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

    let mut parsed = Jpeg::from_bytes(Bytes::from(jpeg)).expect("Fixture is not a JPEG");
    parsed.set_exif(Some(Bytes::from(exif)));
    parsed.encoder().bytes().to_vec()
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .expect("Failed to encode fixture");
    buf
}
