//! SQLite-backed configuration repository.
//!
//! One row per `(env_name, plugin, key)`; `save` replaces a plugin section inside a transaction.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::models::{ConfigEntry, ConfigMap};
use crate::repository::ConfigRepository;
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct SqliteConfigRepository {
    pool_manager: SqlitePoolManager,
}

impl SqliteConfigRepository {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        info!("Creating env_config table if not exist");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS env_config (
                env_name TEXT NOT NULL,
                plugin TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (env_name, plugin, key)
            )
            "#,
        )
        .execute(self.pool_manager.pool())
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ConfigRepository for SqliteConfigRepository {
    async fn get(&self, env: &str, plugin: &str, key: &str) -> Result<Option<String>, StorageError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT value FROM env_config WHERE env_name = ? AND plugin = ? AND key = ?",
        )
        .bind(env)
        .bind(plugin)
        .bind(key)
        .fetch_optional(self.pool_manager.pool())
        .await?;

        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, env: &str, plugin: &str, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO env_config (env_name, plugin, key, value, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (env_name, plugin, key)
            DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(env)
        .bind(plugin)
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(self.pool_manager.pool())
        .await?;

        debug!(env = %env, plugin = %plugin, key = %key, "config value set");
        Ok(())
    }

    async fn load(&self, env: &str, plugin: &str) -> Result<ConfigMap, StorageError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT key, value FROM env_config WHERE env_name = ? AND plugin = ?",
        )
        .bind(env)
        .bind(plugin)
        .fetch_all(self.pool_manager.pool())
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn save(&self, env: &str, plugin: &str, config: &ConfigMap) -> Result<(), StorageError> {
        let now = Utc::now();
        let mut tx = self.pool_manager.pool().begin().await?;

        sqlx::query("DELETE FROM env_config WHERE env_name = ? AND plugin = ?")
            .bind(env)
            .bind(plugin)
            .execute(&mut *tx)
            .await?;

        for (key, value) in config.iter() {
            sqlx::query(
                "INSERT INTO env_config (env_name, plugin, key, value, updated_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(env)
            .bind(plugin)
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(env = %env, plugin = %plugin, keys = config.len(), "config section saved");
        Ok(())
    }

    async fn entries(&self, env: &str) -> Result<Vec<ConfigEntry>, StorageError> {
        let entries = sqlx::query_as::<_, ConfigEntry>(
            r#"
            SELECT env_name, plugin, key, value, updated_at
            FROM env_config
            WHERE env_name = ?
            ORDER BY plugin, key
            "#,
        )
        .bind(env)
        .fetch_all(self.pool_manager.pool())
        .await?;

        Ok(entries)
    }
}
