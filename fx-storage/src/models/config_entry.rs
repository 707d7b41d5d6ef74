//! Row model of the `env_config` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted configuration value, scoped by environment and plugin.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConfigEntry {
    pub env_name: String,
    pub plugin: String,
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

impl ConfigEntry {
    pub fn new(env_name: &str, plugin: &str, key: &str, value: &str) -> Self {
        Self {
            env_name: env_name.to_string(),
            plugin: plugin.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            updated_at: Utc::now(),
        }
    }
}
