use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{DeviceCache, StorageError};

#[async_trait::async_trait]
impl DeviceCache for SqliteRepository {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        let row = sqlx::query("SELECT value FROM device_cache WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        row.map(|row| {
            let raw: String = row
                .try_get("value")
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            serde_json::from_str(&raw).map_err(|e| StorageError::Serialization(e.to_string()))
        })
        .transpose()
    }

    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        sqlx::query(
            r"
            INSERT INTO device_cache (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
        )
        .bind(key)
        .bind(raw)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM device_cache WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;
        Ok(())
    }
}
