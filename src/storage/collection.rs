use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;

use super::schema::Database;

impl Database {
    // ========================================================================
    // Raw collection rows
    // ========================================================================

    /// Get the stored JSON for a collection key, or `None` if never written.
    pub async fn read_collection(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM collections WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Replace the stored JSON for a collection key (UPSERT).
    pub async fn write_collection(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO collections (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// A whole collection of `T` stored under one key.
///
/// Every save rewrites the full collection. Loading never fails: a missing
/// row is an empty collection, and undecodable data is logged and treated
/// as empty so the app can still start.
pub struct PersistedCollection<T> {
    db: Database,
    key: String,
    _items: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for PersistedCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedCollection")
            .field("key", &self.key)
            .finish()
    }
}

impl<T> PersistedCollection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(db: Database, key: impl Into<String>) -> Self {
        Self {
            db,
            key: key.into(),
            _items: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn load(&self) -> Vec<T> {
        let raw = match self.db.read_collection(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to read collection, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(items) => {
                tracing::debug!(key = %self.key, count = items.len(), "Collection loaded");
                items
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Stored collection is not valid, starting empty");
                Vec::new()
            }
        }
    }

    pub async fn save(&self, items: &[T]) -> Result<()> {
        let json = serde_json::to_string(items)
            .with_context(|| format!("Failed to encode collection '{}'", self.key))?;
        self.db
            .write_collection(&self.key, &json)
            .await
            .with_context(|| format!("Failed to save collection '{}'", self.key))?;
        tracing::debug!(key = %self.key, count = items.len(), "Collection saved");
        Ok(())
    }
}
