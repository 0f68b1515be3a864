//! Image decoding and pixel transformations applied before re-encoding.

pub mod format_policy;
pub mod orientation;
pub mod resize;
pub mod source;

pub use format_policy::{select_output_format, OutputFormat, FORMAT_POLICY};
pub use orientation::ImageOrientation;
pub use resize::{fit_width, target_dimensions};
pub use source::SourceImage;
