//! Domain models shared by the API, the CLI and the repositories.

pub mod media_asset;
pub mod upload;

pub use media_asset::{MediaAsset, NewMediaAsset};
pub use upload::{UploadFailure, UploadResponse, UploadSuccess};
