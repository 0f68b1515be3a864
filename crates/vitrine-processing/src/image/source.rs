use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;

use super::orientation::ImageOrientation;
use crate::error::CompressionError;

/// An uploaded image after decoding, before any transformation.
pub struct SourceImage {
    pub image: DynamicImage,
    pub format: Option<ImageFormat>,
    /// EXIF orientation (1–8), 1 when absent
    pub orientation: u32,
    pub byte_len: usize,
}

impl SourceImage {
    pub fn decode(data: &[u8]) -> Result<Self, CompressionError> {
        if data.is_empty() {
            return Err(CompressionError::Decode("empty file".to_string()));
        }

        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| CompressionError::Decode(e.to_string()))?;
        let format = reader.format();
        let image = reader
            .decode()
            .map_err(|e| CompressionError::Decode(e.to_string()))?;

        // The JPEG decoder pads missing scanlines instead of failing
        if let Some(format) = format {
            ensure_complete(format, data)?;
        }

        Ok(Self {
            image,
            format,
            orientation: ImageOrientation::read_exif_orientation(data),
            byte_len: data.len(),
        })
    }

    /// Fully decode `data` and keep only its format and dimensions.
    ///
    /// Used for uploads forwarded unchanged: reading the header alone would
    /// accept files cut off after it.
    pub fn verify(data: &[u8]) -> Result<(ImageFormat, u32, u32), CompressionError> {
        let source = Self::decode(data)?;
        let format = source
            .format
            .ok_or_else(|| CompressionError::Decode("unrecognized image format".to_string()))?;
        let (width, height) = source.dimensions();
        Ok((format, width, height))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Whether any pixel is not fully opaque.
    pub fn has_meaningful_alpha(&self) -> bool {
        if !self.image.color().has_alpha() {
            return false;
        }
        match &self.image {
            DynamicImage::ImageRgba8(buf) => buf.pixels().any(|p| p.0[3] < u8::MAX),
            DynamicImage::ImageLumaA8(buf) => buf.pixels().any(|p| p.0[1] < u8::MAX),
            other => other.to_rgba8().pixels().any(|p| p.0[3] < u8::MAX),
        }
    }

    /// Pixels rotated upright; the orientation tag itself is not carried over.
    pub fn into_upright(self) -> DynamicImage {
        if self.orientation != 1 {
            tracing::debug!(orientation = self.orientation, "Applying EXIF orientation");
        }
        ImageOrientation::apply(self.image, self.orientation)
    }
}

fn ensure_complete(format: ImageFormat, data: &[u8]) -> Result<(), CompressionError> {
    let complete = match format {
        ImageFormat::Jpeg => jpeg_scan_is_terminated(data),
        ImageFormat::Png => data.windows(4).any(|w| w == b"IEND"),
        _ => true,
    };
    if !complete {
        return Err(CompressionError::Decode(format!("truncated {:?} data", format)));
    }
    Ok(())
}

/// Walk the marker segments up to the first SOS, then require an EOI in the
/// entropy-coded data after it. Markers inside an EXIF thumbnail are skipped
/// along with their APP1 segment.
fn jpeg_scan_is_terminated(data: &[u8]) -> bool {
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return false;
        }
        let marker = data[pos + 1];
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let segment_end = pos + 2 + len;
        if marker == 0xDA {
            return data
                .get(segment_end..)
                .is_some_and(|scan| scan.windows(2).any(|w| w == [0xFF, 0xD9]));
        }
        pos = segment_end;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn test_decode_png() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(8, 4));
        let source = SourceImage::decode(&encode(&img, ImageFormat::Png)).unwrap();
        assert_eq!(source.format, Some(ImageFormat::Png));
        assert_eq!(source.dimensions(), (8, 4));
        assert_eq!(source.orientation, 1);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            SourceImage::decode(b"definitely not an image"),
            Err(CompressionError::Decode(_))
        ));
        assert!(matches!(
            SourceImage::decode(b""),
            Err(CompressionError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_jpeg() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(32, 32));
        let jpeg = encode(&img, ImageFormat::Jpeg);
        assert!(matches!(
            SourceImage::decode(&jpeg[..20]),
            Err(CompressionError::Decode(_))
        ));
    }

    #[test]
    fn test_verify_reads_dimensions() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(12, 7));
        let (format, w, h) = SourceImage::verify(&encode(&img, ImageFormat::Png)).unwrap();
        assert_eq!(format, ImageFormat::Png);
        assert_eq!((w, h), (12, 7));
        assert!(SourceImage::verify(b"plain text").is_err());
    }

    #[test]
    fn test_half_of_a_file_is_rejected() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_fn(64, 64, |x, y| {
            image::Rgb([(x * 3) as u8, (y * 3) as u8, (x ^ y) as u8])
        }));
        for format in [ImageFormat::Jpeg, ImageFormat::Png] {
            let data = encode(&img, format);
            let half = &data[..data.len() / 2];
            assert!(
                matches!(SourceImage::decode(half), Err(CompressionError::Decode(_))),
                "{:?} cut in half decoded",
                format
            );
            assert!(SourceImage::verify(half).is_err());
            assert!(SourceImage::verify(&data).is_ok());
        }
    }

    #[test]
    fn test_jpeg_terminator_search_skips_app_segments() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(16, 16));
        let jpeg = encode(&img, ImageFormat::Jpeg);
        assert!(jpeg_scan_is_terminated(&jpeg));
        assert!(!jpeg_scan_is_terminated(&jpeg[..jpeg.len() - 2]));

        // An APP1 payload holding its own EOI must not count
        let mut with_app1 = jpeg[..2].to_vec();
        with_app1.extend_from_slice(&[0xFF, 0xE1, 0x00, 0x06, 0xFF, 0xD9, 0x00, 0x00]);
        with_app1.extend_from_slice(&jpeg[2..jpeg.len() - 2]);
        assert!(!jpeg_scan_is_terminated(&with_app1));
    }

    #[test]
    fn test_alpha_detection() {
        let mut rgba = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        let opaque = SourceImage::decode(&encode(
            &DynamicImage::ImageRgba8(rgba.clone()),
            ImageFormat::Png,
        ))
        .unwrap();
        assert!(!opaque.has_meaningful_alpha());

        rgba.put_pixel(2, 2, Rgba([10, 20, 30, 0]));
        let transparent =
            SourceImage::decode(&encode(&DynamicImage::ImageRgba8(rgba), ImageFormat::Png))
                .unwrap();
        assert!(transparent.has_meaningful_alpha());
    }
}
