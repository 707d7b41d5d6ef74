//! SQLite connection pool wrapper for the storage crate.

use std::path::Path;
use std::str::FromStr;

use log::info;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};

/// Manages a single SQLite pool; creates the DB file (and its folder) if missing.
#[derive(Clone)]
pub struct SqlitePoolManager {
    pool: SqlitePool,
}

impl SqlitePoolManager {
    /// Accepts a `sqlite:` URL or a plain file path.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        info!("Initializing SQLite pool: {}", database_url);

        let options = if database_url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(database_url)?
        } else {
            if let Some(parent) = Path::new(database_url).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            SqliteConnectOptions::new().filename(database_url)
        };

        let pool = SqlitePool::connect_with(options.create_if_missing(true)).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
