//! Output format selection.
//!
//! Lossless and already-WEBP sources are re-encoded as WEBP, everything else
//! as JPEG. A source with transparent pixels always goes to WEBP so the alpha
//! channel survives.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use vitrine_core::CompressionConfig;

use crate::error::CompressionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    WebP,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::WebP => "webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::WebP => "image/webp",
        }
    }

    /// Lowest quality the search may reach for this format
    pub fn min_quality(&self, config: &CompressionConfig) -> u8 {
        match self {
            OutputFormat::Jpeg => config.jpeg_min_quality,
            OutputFormat::WebP => config.webp_min_quality,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source formats with an explicit mapping. Any other decodable format is
/// re-encoded as [`DEFAULT_OUTPUT`].
pub const FORMAT_POLICY: &[(ImageFormat, OutputFormat)] = &[
    (ImageFormat::Png, OutputFormat::WebP),
    (ImageFormat::Tiff, OutputFormat::WebP),
    (ImageFormat::WebP, OutputFormat::WebP),
    (ImageFormat::Jpeg, OutputFormat::Jpeg),
];

pub const DEFAULT_OUTPUT: OutputFormat = OutputFormat::Jpeg;

/// Pick the encoder for a decoded source.
///
/// Fails only when the decoder did not report a source format at all.
pub fn select_output_format(
    source: Option<ImageFormat>,
    has_alpha: bool,
) -> Result<OutputFormat, CompressionError> {
    let source = source.ok_or_else(|| {
        CompressionError::UnsupportedFormat("source format could not be determined".to_string())
    })?;

    if has_alpha {
        return Ok(OutputFormat::WebP);
    }

    Ok(FORMAT_POLICY
        .iter()
        .find(|(from, _)| *from == source)
        .map(|(_, to)| *to)
        .unwrap_or(DEFAULT_OUTPUT))
}
