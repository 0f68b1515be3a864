pub mod content;
pub mod gallery;
pub mod health;
pub mod image_upload;
pub mod image_urls;
