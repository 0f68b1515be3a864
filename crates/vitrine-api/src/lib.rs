//! Vitrine API library
//!
//! Exposes the HTTP surface of the media layer: image upload with adaptive
//! compression, the asset gallery, content documents and image slot
//! population. The binary in `main.rs` wires it to a listener.

pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod utils;
