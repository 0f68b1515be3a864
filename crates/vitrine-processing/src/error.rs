use vitrine_core::AppError;

/// Failures of the compression pipeline
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("no encoder for source format {0}")]
    UnsupportedFormat(String),

    #[error("failed to encode {format}: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    #[error("invalid compression configuration: {0}")]
    InvalidConfig(String),
}

impl From<CompressionError> for AppError {
    fn from(err: CompressionError) -> Self {
        match err {
            CompressionError::Decode(msg) => AppError::Decode(msg),
            CompressionError::UnsupportedFormat(msg) => AppError::UnsupportedFormat(msg),
            CompressionError::InvalidConfig(msg) => AppError::Configuration(msg),
            e @ CompressionError::Encode { .. } => AppError::ImageProcessing(e.to_string()),
        }
    }
}
