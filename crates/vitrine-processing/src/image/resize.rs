use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use vitrine_core::ResampleFilter;

pub fn filter_type(filter: ResampleFilter) -> FilterType {
    match filter {
        ResampleFilter::Nearest => FilterType::Nearest,
        ResampleFilter::Triangle => FilterType::Triangle,
        ResampleFilter::CatmullRom => FilterType::CatmullRom,
        ResampleFilter::Gaussian => FilterType::Gaussian,
        ResampleFilter::Lanczos3 => FilterType::Lanczos3,
    }
}

/// Dimensions after capping the width at `max_width`.
///
/// Wider images get exactly `max_width` and a height scaled by the same
/// factor, rounded, never below 1. Narrower images keep their size.
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let scaled = (height as f64 * max_width as f64 / width as f64).round();
    (max_width, (scaled as u32).max(1))
}

/// Downscale to `max_width` preserving aspect ratio; never upscales.
pub fn fit_width(img: DynamicImage, max_width: u32, filter: ResampleFilter) -> DynamicImage {
    let (width, height) = img.dimensions();
    let (new_width, new_height) = target_dimensions(width, height, max_width);
    if (new_width, new_height) == (width, height) {
        return img;
    }

    tracing::debug!(
        from_width = width,
        from_height = height,
        to_width = new_width,
        to_height = new_height,
        filter = %filter,
        "Downscaling image"
    );
    img.resize_exact(new_width, new_height, filter_type(filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_target_dimensions() {
        assert_eq!(target_dimensions(6000, 4000, 5000), (5000, 3333));
        assert_eq!(target_dimensions(8000, 6000, 5000), (5000, 3750));
        assert_eq!(target_dimensions(5000, 4000, 5000), (5000, 4000));
        assert_eq!(target_dimensions(1200, 800, 5000), (1200, 800));
        // 3001 * 2 / 3 = 2000.67
        assert_eq!(target_dimensions(3, 3001, 2), (2, 2001));
        assert_eq!(target_dimensions(20000, 1, 5000), (5000, 1));
    }

    #[test]
    fn test_fit_width_downscales() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(600, 400));
        let out = fit_width(img, 500, ResampleFilter::Lanczos3);
        assert_eq!(out.dimensions(), (500, 333));
    }

    #[test]
    fn test_fit_width_never_upscales() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(300, 200));
        let out = fit_width(img, 500, ResampleFilter::Lanczos3);
        assert_eq!(out.dimensions(), (300, 200));
    }
}
