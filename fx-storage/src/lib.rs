//! Storage crate: persisted lifecycle configuration.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – ConfigEntry, ConfigMap
//! - [`repository`] – ConfigRepository trait
//! - [`sqlite_config_repo`] – SqliteConfigRepository
//! - [`memory_config_repo`] – InMemoryConfigRepository
//! - [`sqlite_pool`] – SqlitePoolManager

mod error;
mod memory_config_repo;
mod models;
mod repository;
mod sqlite_config_repo;
mod sqlite_pool;

#[cfg(test)]
mod config_repo_test;

pub use error::StorageError;
pub use memory_config_repo::InMemoryConfigRepository;
pub use models::{ConfigEntry, ConfigMap};
pub use repository::ConfigRepository;
pub use sqlite_config_repo::SqliteConfigRepository;
pub use sqlite_pool::SqlitePoolManager;
