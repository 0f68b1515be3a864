//! Local compression of a single file.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use vitrine_processing::{CompressionSummary, ImageCompressor, OutputFormat};

#[derive(Debug, Serialize)]
pub struct CompressReport {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(flatten)]
    pub summary: CompressionSummary,
}

/// `<dir>/<stem>.compressed.<ext>` next to the input.
pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    input.with_file_name(format!("{}.compressed.{}", stem, format.extension()))
}

/// Compress `input` regardless of its size and write the result.
pub fn compress_to_file(
    compressor: &ImageCompressor,
    input: &Path,
    output: Option<&Path>,
) -> Result<CompressReport> {
    let result = compressor
        .compress_file(input)
        .with_context(|| format!("Failed to compress {}", input.display()))?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input, result.format));
    std::fs::write(&output, &result.data)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        size = result.size(),
        "Compressed image written"
    );

    Ok(CompressReport {
        input: input.to_path_buf(),
        output,
        summary: result.summary(),
    })
}
