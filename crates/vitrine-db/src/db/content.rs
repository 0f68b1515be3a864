use chrono::Utc;
use serde_json::Value;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use std::collections::{BTreeMap, BTreeSet};
use vitrine_core::image_slots::{self, PopulateMode, SlotChange, SlotReport};
use vitrine_core::AppError;

/// Keyed JSON documents rendered by the public site (hero, navigation, ...)
#[derive(Clone)]
pub struct ContentStore {
    pool: SqlitePool,
}

impl ContentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Parse and validate a JSON object mapping keys to documents.
    pub fn parse_seed(json: &str) -> Result<BTreeMap<String, Value>, AppError> {
        let documents: BTreeMap<String, Value> = serde_json::from_str(json)?;
        for (key, doc) in &documents {
            validate_key(key)?;
            validate_document(doc)?;
        }
        Ok(documents)
    }

    /// Insert seed documents whose key is not stored yet; edits made through
    /// the dashboard are never overwritten. Returns how many were inserted.
    #[tracing::instrument(skip(self, documents), fields(db.table = "content_documents", db.operation = "insert"))]
    pub async fn seed(&self, documents: &BTreeMap<String, Value>) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let mut inserted = 0;
        for (key, document) in documents {
            validate_key(key)?;
            validate_document(document)?;
            inserted += sqlx::query(
                "INSERT OR IGNORE INTO content_documents (key, document, updated_at) VALUES (?1, ?2, ?3)",
            )
            .bind(key)
            .bind(document.to_string())
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn keys(&self) -> Result<Vec<String>, AppError> {
        let keys = sqlx::query_scalar::<Sqlite, String>(
            "SELECT key FROM content_documents ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(keys)
    }

    #[tracing::instrument(skip(self), fields(db.table = "content_documents", db.operation = "select"))]
    pub async fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
        let text = sqlx::query_scalar::<Sqlite, String>(
            "SELECT document FROM content_documents WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        text.map(|t| decode_document(key, &t)).transpose()
    }

    /// Insert or replace a document
    #[tracing::instrument(skip(self, document), fields(db.table = "content_documents", db.operation = "upsert"))]
    pub async fn put(&self, key: &str, document: Value) -> Result<(), AppError> {
        validate_key(key)?;
        validate_document(&document)?;
        upsert_document(&self.pool, key, &document).await
    }

    pub async fn snapshot(&self) -> Result<BTreeMap<String, Value>, AppError> {
        let mut conn = self.pool.acquire().await?;
        load_documents(&mut conn).await
    }

    /// Fill image slots from `pool` inside one transaction, writing back only
    /// the documents that changed.
    #[tracing::instrument(skip(self, pool), fields(db.table = "content_documents", db.operation = "update"))]
    pub async fn populate_image_slots(
        &self,
        pool: &[String],
        mode: PopulateMode,
        dry_run: bool,
    ) -> Result<Vec<SlotChange>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut documents = load_documents(&mut tx).await?;
        let changes = image_slots::populate(&mut documents, pool, mode, dry_run);

        if !dry_run {
            let touched: BTreeSet<&str> = changes.iter().map(|c| c.document.as_str()).collect();
            for key in touched {
                if let Some(document) = documents.get(key) {
                    upsert_document(&mut *tx, key, document).await?;
                }
            }
        }
        tx.commit().await?;

        Ok(changes)
    }

    pub async fn image_slot_report(&self, pool_size: usize) -> Result<SlotReport, AppError> {
        let documents = self.snapshot().await?;
        Ok(image_slots::report(&documents, pool_size))
    }
}

async fn load_documents(conn: &mut SqliteConnection) -> Result<BTreeMap<String, Value>, AppError> {
    let rows = sqlx::query_as::<Sqlite, (String, String)>(
        "SELECT key, document FROM content_documents ORDER BY key",
    )
    .fetch_all(conn)
    .await?;

    rows.into_iter()
        .map(|(key, text)| {
            let document = decode_document(&key, &text)?;
            Ok((key, document))
        })
        .collect()
}

async fn upsert_document<'e, E>(executor: E, key: &str, document: &Value) -> Result<(), AppError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO content_documents (key, document, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (key) DO UPDATE SET
            document = excluded.document,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(document.to_string())
    .bind(Utc::now())
    .execute(executor)
    .await?;
    Ok(())
}

/// Stored documents were validated on write; a parse failure means the row
/// was edited outside the service.
fn decode_document(key: &str, text: &str) -> Result<Value, AppError> {
    serde_json::from_str(text).map_err(|e| {
        AppError::Internal(format!("Stored content '{}' is not valid JSON: {}", key, e))
    })
}

/// Keys are lowercase identifiers: ASCII letters, digits, `_` and `-`.
fn validate_key(key: &str) -> Result<(), AppError> {
    let valid = !key.is_empty()
        && key.len() <= 128
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if !valid {
        return Err(AppError::InvalidInput(format!(
            "Invalid content key: {:?}",
            key
        )));
    }
    Ok(())
}

fn validate_document(document: &Value) -> Result<(), AppError> {
    if !document.is_object() {
        return Err(AppError::InvalidInput(
            "Content document must be a JSON object".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = ContentStore::new(test_pool().await);
        store
            .put("hero", json!({"title": "Stone", "image_url": null}))
            .await
            .unwrap();

        assert_eq!(store.keys().await.unwrap(), vec!["hero"]);
        assert_eq!(store.get("hero").await.unwrap().unwrap()["title"], "Stone");
        assert!(store.get("missing").await.unwrap().is_none());

        store.put("hero", json!({"title": "Tile"})).await.unwrap();
        assert_eq!(store.get("hero").await.unwrap().unwrap(), json!({"title": "Tile"}));
    }

    #[tokio::test]
    async fn test_put_validates() {
        let store = ContentStore::new(test_pool().await);
        assert!(matches!(
            store.put("Hero Page", json!({})).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            store.put("hero", json!(["not", "an", "object"])).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_populate_writes_through() {
        let store = ContentStore::new(test_pool().await);
        store.put("hero", json!({"image_url": ""})).await.unwrap();
        store.put("about", json!({"title": "About"})).await.unwrap();

        let pool = vec!["https://cdn/a.jpg".to_string()];
        let changes = store
            .populate_image_slots(&pool, PopulateMode::FillEmpty, false)
            .await
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(
            store.get("hero").await.unwrap().unwrap()["image_url"],
            "https://cdn/a.jpg"
        );
        assert_eq!(store.get("about").await.unwrap().unwrap(), json!({"title": "About"}));

        let report = store.image_slot_report(pool.len()).await.unwrap();
        assert_eq!(report.filled, 1);
        assert_eq!(report.empty, 0);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let store = ContentStore::new(test_pool().await);
        store.put("hero", json!({"image_url": null})).await.unwrap();

        let pool = vec!["https://cdn/a.jpg".to_string()];
        let changes = store
            .populate_image_slots(&pool, PopulateMode::ReplaceAll, true)
            .await
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(store.get("hero").await.unwrap().unwrap()["image_url"], Value::Null);
    }

    #[tokio::test]
    async fn test_seed_keeps_existing_documents() {
        let store = ContentStore::new(test_pool().await);
        store.put("hero", json!({"title": "Edited"})).await.unwrap();

        let seed = ContentStore::parse_seed(
            r#"{"hero": {"title": "Seeded"}, "footer": {"text": "(c)"}}"#,
        )
        .unwrap();
        assert_eq!(store.seed(&seed).await.unwrap(), 1);

        assert_eq!(store.get("hero").await.unwrap().unwrap()["title"], "Edited");
        assert_eq!(store.keys().await.unwrap(), vec!["footer", "hero"]);
    }

    #[test]
    fn test_parse_seed() {
        assert!(ContentStore::parse_seed(r#"{"hero": {"image_url": null}}"#).is_ok());
        assert!(ContentStore::parse_seed(r#"{"hero": 3}"#).is_err());
        assert!(ContentStore::parse_seed(r#"{"Bad Key": {}}"#).is_err());
        assert!(ContentStore::parse_seed("[]").is_err());
    }
}
