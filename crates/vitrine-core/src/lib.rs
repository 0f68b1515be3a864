//! Vitrine Core Library
//!
//! This crate provides the domain models, error types and configuration shared
//! by every Vitrine component, plus the image slot utilities used to fill
//! content documents with uploaded asset URLs.

pub mod config;
pub mod error;
pub mod image_slots;
pub mod models;
pub mod slug;
pub mod storage_types;

// Re-export commonly used types
pub use config::{
    BaseConfig, CloudinaryCredentials, CompressionConfig, Config, DatabaseConfig, MediaHostConfig,
    ResampleFilter, UploadConfig,
};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::MediaHostBackend;
