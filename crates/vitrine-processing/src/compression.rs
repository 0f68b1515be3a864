//! Adaptive compression.
//!
//! Uploads above the byte cap are decoded, turned upright, capped in width
//! and re-encoded with a descending quality search until the result fits
//! under the target size or the format's quality floor is reached. Uploads
//! at or below the cap pass through byte for byte.

use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use vitrine_core::CompressionConfig;

use crate::encoder;
use crate::error::CompressionError;
use crate::image::{fit_width, select_output_format, OutputFormat, SourceImage};

/// Output of one compression run.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub data: Bytes,
    pub format: OutputFormat,
    /// Quality of the returned encoding
    pub quality: u8,
    /// Every quality tried, in order
    pub attempts: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub original_size: usize,
}

impl CompressionResult {
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn summary(&self) -> CompressionSummary {
        CompressionSummary {
            format: self.format,
            quality: self.quality,
            attempts: self.attempts.clone(),
            original_size: self.original_size,
            compressed_size: self.data.len(),
            width: self.width,
            height: self.height,
        }
    }
}

/// Serializable description of a compression run, without the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionSummary {
    pub format: OutputFormat,
    pub quality: u8,
    pub attempts: Vec<u8>,
    pub original_size: usize,
    pub compressed_size: usize,
    pub width: u32,
    pub height: u32,
}

/// What gets sent to the media host.
#[derive(Debug, Clone)]
pub enum PreparedUpload {
    /// At or under the cap: the uploaded bytes, untouched
    Original {
        data: Bytes,
        format: ImageFormat,
        width: u32,
        height: u32,
    },
    Compressed(CompressionResult),
}

impl PreparedUpload {
    pub fn data(&self) -> &Bytes {
        match self {
            PreparedUpload::Original { data, .. } => data,
            PreparedUpload::Compressed(result) => &result.data,
        }
    }

    pub fn into_data(self) -> Bytes {
        match self {
            PreparedUpload::Original { data, .. } => data,
            PreparedUpload::Compressed(result) => result.data,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            PreparedUpload::Original { format, .. } => format.to_mime_type(),
            PreparedUpload::Compressed(result) => result.format.mime_type(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            PreparedUpload::Original { width, height, .. } => (*width, *height),
            PreparedUpload::Compressed(result) => (result.width, result.height),
        }
    }

    pub fn compression(&self) -> Option<&CompressionResult> {
        match self {
            PreparedUpload::Original { .. } => None,
            PreparedUpload::Compressed(result) => Some(result),
        }
    }
}

/// Descending quality search.
///
/// Encodes at `initial`, then at `max(floor, q - step)` while the output is
/// larger than `target` and `q` is above `floor`. The attempted qualities are
/// strictly decreasing and never below `floor`.
#[derive(Debug, Clone, Copy)]
pub struct QualitySearch {
    pub initial: u8,
    pub floor: u8,
    pub step: u8,
    pub target: u64,
}

/// Winning encoding of a [`QualitySearch`].
#[derive(Debug)]
pub struct SearchOutcome {
    pub data: Vec<u8>,
    pub quality: u8,
    pub attempts: Vec<u8>,
}

impl QualitySearch {
    pub fn run<F>(&self, mut encode: F) -> Result<SearchOutcome, CompressionError>
    where
        F: FnMut(u8) -> Result<Vec<u8>, CompressionError>,
    {
        if self.step == 0 {
            return Err(CompressionError::InvalidConfig(
                "quality step must be greater than 0".to_string(),
            ));
        }

        let floor = self.floor.min(self.initial);
        let mut quality = self.initial;
        let mut attempts = Vec::new();

        loop {
            let data = encode(quality)?;
            attempts.push(quality);

            let size = data.len() as u64;
            tracing::trace!(quality = quality, size = size, target = self.target, "Encoded attempt");

            if size <= self.target || quality <= floor {
                return Ok(SearchOutcome {
                    data,
                    quality,
                    attempts,
                });
            }
            quality = quality.saturating_sub(self.step).max(floor);
        }
    }
}

/// Adaptive compressor configured once and shared across requests.
#[derive(Debug, Clone)]
pub struct ImageCompressor {
    config: CompressionConfig,
}

impl ImageCompressor {
    pub fn new(config: CompressionConfig) -> Result<Self, CompressionError> {
        config
            .validate()
            .map_err(|e| CompressionError::InvalidConfig(e.to_string()))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Pass small uploads through; compress the ones above the cap.
    ///
    /// Small uploads are still fully decoded so that unreadable or truncated
    /// files are rejected before anything reaches the media host.
    pub fn prepare(&self, data: Bytes) -> Result<PreparedUpload, CompressionError> {
        if !self.config.should_compress(data.len() as u64) {
            let (format, width, height) = SourceImage::verify(&data)?;
            tracing::debug!(
                size = data.len(),
                max_bytes = self.config.max_bytes,
                format = ?format,
                width = width,
                height = height,
                "Upload under size cap, forwarding unchanged"
            );
            return Ok(PreparedUpload::Original {
                data,
                format,
                width,
                height,
            });
        }

        self.compress(&data).map(PreparedUpload::Compressed)
    }

    /// Decode, normalise and re-encode `data` regardless of its size.
    pub fn compress(&self, data: &[u8]) -> Result<CompressionResult, CompressionError> {
        let source = SourceImage::decode(data)?;
        let output_format = select_output_format(source.format, source.has_meaningful_alpha())?;
        let original_size = source.byte_len;
        let source_format = source.format;

        let img = fit_width(
            source.into_upright(),
            self.config.max_width,
            self.config.resample_filter,
        );
        let result = self.encode_with_search(&img, output_format, original_size)?;

        tracing::info!(
            source_format = ?source_format,
            output_format = %result.format,
            original_size = original_size,
            compressed_size = result.size(),
            quality = result.quality,
            attempts = result.attempts.len(),
            width = result.width,
            height = result.height,
            "Image compressed"
        );

        if result.size() as u64 > self.config.target_bytes {
            tracing::warn!(
                compressed_size = result.size(),
                target_bytes = self.config.target_bytes,
                floor = result.quality,
                "Compressed image still above target at quality floor"
            );
        }

        Ok(result)
    }

    pub fn compress_reader<R: Read>(
        &self,
        mut reader: R,
    ) -> Result<CompressionResult, CompressionError> {
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| CompressionError::Decode(e.to_string()))?;
        self.compress(&data)
    }

    pub fn compress_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<CompressionResult, CompressionError> {
        let file = std::fs::File::open(path.as_ref()).map_err(|e| {
            CompressionError::Decode(format!("{}: {}", path.as_ref().display(), e))
        })?;
        self.compress_reader(std::io::BufReader::new(file))
    }

    fn encode_with_search(
        &self,
        img: &DynamicImage,
        format: OutputFormat,
        original_size: usize,
    ) -> Result<CompressionResult, CompressionError> {
        let search = QualitySearch {
            initial: self.config.initial_quality,
            floor: format.min_quality(&self.config),
            step: self.config.quality_step,
            target: self.config.target_bytes,
        };
        let outcome = search.run(|quality| encoder::encode(img, format, quality))?;
        let (width, height) = img.dimensions();

        Ok(CompressionResult {
            data: Bytes::from(outcome.data),
            format,
            quality: outcome.quality,
            attempts: outcome.attempts,
            width,
            height,
            original_size,
        })
    }
}
