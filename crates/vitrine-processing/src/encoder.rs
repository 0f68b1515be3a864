//! Lossy encoders used by the quality search.

use image::{DynamicImage, GenericImageView};

use crate::error::CompressionError;
use crate::image::OutputFormat;

/// WEBP effort level, 0 (fast) to 6 (smallest output).
const WEBP_METHOD: i32 = 6;

/// Encode `img` as `format` at `quality` (1–100).
pub fn encode(
    img: &DynamicImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, CompressionError> {
    match format {
        OutputFormat::Jpeg => encode_jpeg(img, quality),
        OutputFormat::WebP => encode_webp(img, quality),
    }
}

/// Progressive JPEG with optimized Huffman tables. mozjpeg's default
/// sampling for RGB input is 4:2:0.
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressionError> {
    let rgb_img = img.to_rgb8();
    let (width, height) = rgb_img.dimensions();
    let jpeg_err = |e: std::io::Error| CompressionError::Encode {
        format: "jpeg",
        message: e.to_string(),
    };

    let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(quality as f32);
    comp.set_progressive_mode();
    comp.set_optimize_coding(true);

    let mut comp = comp.start_compress(Vec::new()).map_err(jpeg_err)?;
    comp.write_scanlines(&rgb_img).map_err(jpeg_err)?;
    comp.finish().map_err(jpeg_err)
}

fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressionError> {
    let (width, height) = img.dimensions();

    let mut config = webp::WebPConfig::new().map_err(|_| CompressionError::Encode {
        format: "webp",
        message: "failed to initialise encoder configuration".to_string(),
    })?;
    config.quality = quality as f32;
    config.method = WEBP_METHOD;

    let encoded = if img.color().has_alpha() {
        let rgba_img = img.to_rgba8();
        webp::Encoder::from_rgba(&rgba_img, width, height).encode_advanced(&config)
    } else {
        let rgb_img = img.to_rgb8();
        webp::Encoder::from_rgb(&rgb_img, width, height).encode_advanced(&config)
    };

    encoded
        .map(|data| data.to_vec())
        .map_err(|e| CompressionError::Encode {
            format: "webp",
            message: format!("{:?}", e),
        })
}
