//! Configuration repository abstraction.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::{ConfigEntry, ConfigMap};

/// Key-value store scoped by environment name and plugin name.
///
/// `load`/`save` move a whole plugin section; `save` replaces the section.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    async fn get(&self, env: &str, plugin: &str, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, env: &str, plugin: &str, key: &str, value: &str) -> Result<(), StorageError>;
    async fn load(&self, env: &str, plugin: &str) -> Result<ConfigMap, StorageError>;
    async fn save(&self, env: &str, plugin: &str, config: &ConfigMap) -> Result<(), StorageError>;
    /// All entries of an environment, ordered by plugin then key.
    async fn entries(&self, env: &str) -> Result<Vec<ConfigEntry>, StorageError>;
}
