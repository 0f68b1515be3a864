use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use std::collections::HashSet;
use uuid::Uuid;
use vitrine_core::models::{MediaAsset, NewMediaAsset};
use vitrine_core::slug::{slugify, unique_slug};
use vitrine_core::AppError;

const ASSET_COLUMNS: &str = "id, title, slug, public_id, secure_url, web_url, thumb_url, \
     bytes_size, width, height, format, tags_csv, is_active, sort_order, created_at, updated_at";

/// Row as stored: SQLite integers are signed 64-bit.
#[derive(sqlx::FromRow)]
struct MediaAssetRow {
    id: Uuid,
    title: String,
    slug: String,
    public_id: String,
    secure_url: String,
    web_url: String,
    thumb_url: String,
    bytes_size: i64,
    width: i64,
    height: i64,
    format: String,
    tags_csv: String,
    is_active: bool,
    sort_order: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MediaAssetRow> for MediaAsset {
    fn from(row: MediaAssetRow) -> Self {
        MediaAsset {
            id: row.id,
            title: row.title,
            slug: row.slug,
            public_id: row.public_id,
            secure_url: row.secure_url,
            web_url: row.web_url,
            thumb_url: row.thumb_url,
            bytes_size: row.bytes_size.max(0) as u64,
            width: row.width.clamp(0, u32::MAX as i64) as u32,
            height: row.height.clamp(0, u32::MAX as i64) as u32,
            format: row.format,
            tags_csv: row.tags_csv,
            is_active: row.is_active,
            sort_order: row.sort_order as i32,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for uploaded media assets
#[derive(Clone)]
pub struct MediaAssetRepository {
    pool: SqlitePool,
}

impl MediaAssetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register an uploaded asset, or refresh the one already stored under the
    /// same `public_id`.
    ///
    /// The media host overwrites on re-upload, so a second upload of the same
    /// file updates URLs, size, format and tags while the id and slug stay.
    /// New slugs are derived from the title and made unique with a numeric
    /// suffix.
    #[tracing::instrument(skip(self, new), fields(db.table = "media_assets", db.operation = "upsert"))]
    pub async fn create(&self, new: NewMediaAsset) -> Result<MediaAsset, AppError> {
        let base = slugify(&new.title);
        let taken: HashSet<String> = sqlx::query_scalar::<Sqlite, String>(
            "SELECT slug FROM media_assets WHERE slug = ?1 OR slug LIKE ?1 || '-%'",
        )
        .bind(&base)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .collect();
        let slug = unique_slug(&base, |candidate| taken.contains(candidate));

        let tags_csv = new
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        let now = Utc::now();

        let row = sqlx::query_as::<Sqlite, MediaAssetRow>(&format!(
            r#"
            INSERT INTO media_assets (
                id, title, slug, public_id, secure_url, web_url, thumb_url,
                bytes_size, width, height, format, tags_csv, is_active, sort_order,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 1, 0, ?13, ?13)
            ON CONFLICT (public_id) DO UPDATE SET
                secure_url = excluded.secure_url,
                web_url = excluded.web_url,
                thumb_url = excluded.thumb_url,
                bytes_size = excluded.bytes_size,
                width = excluded.width,
                height = excluded.height,
                format = excluded.format,
                tags_csv = excluded.tags_csv,
                updated_at = excluded.updated_at
            RETURNING {}
            "#,
            ASSET_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(&slug)
        .bind(&new.public_id)
        .bind(&new.secure_url)
        .bind(&new.web_url)
        .bind(&new.thumb_url)
        .bind(new.bytes_size as i64)
        .bind(i64::from(new.width))
        .bind(i64::from(new.height))
        .bind(&new.format)
        .bind(&tags_csv)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        let asset = MediaAsset::from(row);
        tracing::debug!(
            asset_id = %asset.id,
            slug = %asset.slug,
            public_id = %asset.public_id,
            "Media asset registered"
        );
        Ok(asset)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media_assets", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<MediaAsset>, AppError> {
        let row = sqlx::query_as::<Sqlite, MediaAssetRow>(&format!(
            "SELECT {} FROM media_assets WHERE id = ?1",
            ASSET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MediaAsset::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "media_assets", db.operation = "select"))]
    pub async fn get_by_public_id(&self, public_id: &str) -> Result<Option<MediaAsset>, AppError> {
        let row = sqlx::query_as::<Sqlite, MediaAssetRow>(&format!(
            "SELECT {} FROM media_assets WHERE public_id = ?1",
            ASSET_COLUMNS
        ))
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MediaAsset::from))
    }

    /// Active assets, newest first.
    #[tracing::instrument(skip(self), fields(db.table = "media_assets", db.operation = "select"))]
    pub async fn list_active(&self) -> Result<Vec<MediaAsset>, AppError> {
        let rows = sqlx::query_as::<Sqlite, MediaAssetRow>(&format!(
            "SELECT {} FROM media_assets WHERE is_active = 1 ORDER BY created_at DESC, rowid DESC",
            ASSET_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MediaAsset::from).collect())
    }

    /// URLs of active assets, in the order image slots are filled.
    pub async fn active_urls(&self) -> Result<Vec<String>, AppError> {
        Ok(self
            .list_active()
            .await?
            .iter()
            .map(|a| a.url().to_string())
            .collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "media_assets", db.operation = "update", db.record_id = %id))]
    pub async fn toggle_active(&self, id: Uuid) -> Result<MediaAsset, AppError> {
        let row = sqlx::query_as::<Sqlite, MediaAssetRow>(&format!(
            "UPDATE media_assets SET is_active = NOT is_active, updated_at = ?2 WHERE id = ?1 RETURNING {}",
            ASSET_COLUMNS
        ))
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Media asset not found".to_string()))?;

        Ok(MediaAsset::from(row))
    }

    #[tracing::instrument(skip(self), fields(db.table = "media_assets", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM media_assets WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Media asset not found".to_string()));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Sqlite, i64>("SELECT COUNT(*) FROM media_assets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn new_asset(title: &str, public_id: &str) -> NewMediaAsset {
        NewMediaAsset {
            title: title.to_string(),
            public_id: public_id.to_string(),
            secure_url: format!("https://res.example.com/image/upload/v1/{}", public_id),
            web_url: format!(
                "https://res.example.com/image/upload/f_auto,q_auto/v1/{}",
                public_id
            ),
            thumb_url: String::new(),
            bytes_size: 2048,
            width: 800,
            height: 600,
            format: "jpg".to_string(),
            tags: vec![" hero ".to_string(), "".to_string(), "home".to_string()],
        }
    }

    #[tokio::test]
    async fn test_create_assigns_unique_slugs() {
        let repo = MediaAssetRepository::new(test_pool().await);
        let a = repo.create(new_asset("Hero Image", "shop/hero")).await.unwrap();
        let b = repo.create(new_asset("Hero Image", "blog/hero")).await.unwrap();
        let c = repo.create(new_asset("Hero Image", "home/hero")).await.unwrap();

        assert_eq!(a.slug, "hero-image");
        assert_eq!(b.slug, "hero-image-1");
        assert_eq!(c.slug, "hero-image-2");
        assert_eq!(a.tags_csv, "hero,home");
        assert!(a.is_active);
        assert_eq!(a.bytes_size, 2048);
        assert_eq!((a.width, a.height), (800, 600));
    }

    #[tokio::test]
    async fn test_same_public_id_updates_existing_asset() {
        let repo = MediaAssetRepository::new(test_pool().await);
        let first = repo
            .create(new_asset("hero.png", "vitrine/uploads/hero"))
            .await
            .unwrap();

        let mut again = new_asset("hero.png", "vitrine/uploads/hero");
        again.bytes_size = 4096;
        again.width = 1200;
        again.format = "webp".to_string();
        again.tags = vec!["summer".to_string()];
        let second = repo.create(again).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.slug, first.slug);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.bytes_size, 4096);
        assert_eq!(second.width, 1200);
        assert_eq!(second.format, "webp");
        assert_eq!(second.tags_csv, "summer");
        assert!(second.updated_at >= first.updated_at);

        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(repo.active_urls().await.unwrap().len(), 1);
        let stored = repo
            .get_by_public_id("vitrine/uploads/hero")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, second);
    }

    #[tokio::test]
    async fn test_list_active_newest_first() {
        let repo = MediaAssetRepository::new(test_pool().await);
        let first = repo.create(new_asset("first.jpg", "a/first")).await.unwrap();
        let second = repo.create(new_asset("second.jpg", "a/second")).await.unwrap();
        let third = repo.create(new_asset("third.jpg", "a/third")).await.unwrap();

        repo.toggle_active(second.id).await.unwrap();

        let active = repo.list_active().await.unwrap();
        let ids: Vec<_> = active.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![third.id, first.id]);

        let urls = repo.active_urls().await.unwrap();
        assert_eq!(urls[0], third.web_url);
    }

    #[tokio::test]
    async fn test_toggle_and_delete_missing() {
        let repo = MediaAssetRepository::new(test_pool().await);
        let missing = Uuid::new_v4();
        assert!(matches!(
            repo.toggle_active(missing).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(repo.delete(missing).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_asset() {
        let repo = MediaAssetRepository::new(test_pool().await);
        let asset = repo.create(new_asset("logo.png", "brand/logo")).await.unwrap();
        assert_eq!(repo.get(asset.id).await.unwrap().unwrap(), asset);

        repo.delete(asset.id).await.unwrap();
        assert!(repo.get(asset.id).await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
