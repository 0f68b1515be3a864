//! Vitrine image processing
//!
//! Adaptive compression of uploaded images: EXIF orientation, width capping
//! and a per-format quality search that brings oversized uploads under the
//! media host's byte limit.

pub mod compression;
pub mod encoder;
pub mod error;
pub mod image;

pub use compression::{
    CompressionResult, CompressionSummary, ImageCompressor, PreparedUpload, QualitySearch,
    SearchOutcome,
};
pub use error::CompressionError;
pub use crate::image::{select_output_format, ImageOrientation, OutputFormat, SourceImage};
