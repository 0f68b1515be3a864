use image::DynamicImage;
use std::io::Cursor;

/// Image orientation operations (EXIF rotation and flipping)
pub struct ImageOrientation;

impl ImageOrientation {
    /// Read the EXIF orientation tag (0x0112) from encoded image data.
    ///
    /// Returns 1 (normal) when the container has no EXIF block, the tag is
    /// missing, or the value is outside 1–8.
    pub fn read_exif_orientation(data: &[u8]) -> u32 {
        let mut cursor = Cursor::new(data);
        let exif = match exif::Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => exif,
            Err(_) => return 1,
        };

        exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|f| f.value.get_uint(0))
            .filter(|o| (1..=8).contains(o))
            .unwrap_or(1)
    }

    /// Rotate/flip the pixels so that the image displays upright without any
    /// orientation tag. Values outside 1–8 leave the image unchanged.
    pub fn apply(img: DynamicImage, orientation: u32) -> DynamicImage {
        match orientation {
            2 => img.fliph(),
            3 => img.rotate180(),
            4 => img.flipv(),
            5 => img.rotate90().fliph(),
            6 => img.rotate90(),
            7 => img.rotate270().fliph(),
            8 => img.rotate270(),
            _ => img,
        }
    }
}
