pub mod content;
pub mod media_asset;

pub use content::ContentStore;
pub use media_asset::MediaAssetRepository;

/// Fresh in-memory database with the schema applied. A single connection
/// keeps the database alive for the whole test.
#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    crate::MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}
