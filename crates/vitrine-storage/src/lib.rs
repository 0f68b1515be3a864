//! Vitrine Storage Library
//!
//! Media host abstraction and its implementations: the Cloudinary upload
//! API and a local filesystem host for development.
//!
//! Every host returns three URLs per image: the stored original, a web
//! variant and a thumbnail variant (see [`derive_variants`]).

pub mod cloudinary;
pub mod factory;
pub mod local;
pub mod traits;
pub mod variants;

// Re-export commonly used types
pub use cloudinary::CloudinaryHost;
pub use factory::create_media_host;
pub use local::LocalMediaHost;
pub use traits::{MediaHost, MediaHostError, MediaHostResult, MediaUpload, UploadedMedia};
pub use variants::derive_variants;
pub use vitrine_core::MediaHostBackend;
