//! Vitrine repositories
//!
//! SQLite-backed stores for the media asset registry and the content
//! documents edited through the dashboard. Both wrap a shared `SqlitePool`
//! and are cheap to clone.

pub mod db;

pub use db::{ContentStore, MediaAssetRepository};

/// Schema migrations from the workspace `migrations/` directory, embedded at
/// build time.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
