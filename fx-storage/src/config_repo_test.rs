//! Unit tests for the configuration repositories.
//!
//! Covers get/set, section save/load replacement and environment scoping.

use crate::memory_config_repo::InMemoryConfigRepository;
use crate::models::ConfigMap;
use crate::repository::ConfigRepository;
use crate::sqlite_config_repo::SqliteConfigRepository;

async fn sqlite_repo(dir: &tempfile::TempDir) -> SqliteConfigRepository {
    let path = dir.path().join("state").join("teamsfx.db");
    SqliteConfigRepository::new(path.to_str().expect("utf-8 path"))
        .await
        .expect("Failed to create repository")
}

async fn assert_set_and_get(repo: &dyn ConfigRepository) {
    repo.set("dev", "fx-resource-bot", "siteName", "site1")
        .await
        .expect("Failed to set");
    repo.set("dev", "fx-resource-bot", "siteName", "site2")
        .await
        .expect("Failed to overwrite");

    let value = repo
        .get("dev", "fx-resource-bot", "siteName")
        .await
        .expect("Failed to get");
    assert_eq!(value.as_deref(), Some("site2"));

    let other_env = repo
        .get("prod", "fx-resource-bot", "siteName")
        .await
        .expect("Failed to get");
    assert!(other_env.is_none());
}

async fn assert_save_replaces_section(repo: &dyn ConfigRepository) {
    let mut first = ConfigMap::new();
    first.set("botId", "id-1");
    first.set("botPassword", "secret");
    repo.save("dev", "fx-resource-bot", &first).await.expect("save");

    let mut solution = ConfigMap::new();
    solution.set("subscriptionId", "sub");
    repo.save("dev", "solution", &solution).await.expect("save");

    let mut second = ConfigMap::new();
    second.set("botId", "id-2");
    repo.save("dev", "fx-resource-bot", &second).await.expect("save");

    let loaded = repo.load("dev", "fx-resource-bot").await.expect("load");
    assert_eq!(loaded, second);
    assert_eq!(loaded.get("botPassword"), None);

    let loaded_solution = repo.load("dev", "solution").await.expect("load");
    assert_eq!(loaded_solution.get("subscriptionId"), Some("sub"));

    let entries = repo.entries("dev").await.expect("entries");
    let keys: Vec<(&str, &str)> = entries
        .iter()
        .map(|e| (e.plugin.as_str(), e.key.as_str()))
        .collect();
    assert_eq!(keys, vec![("fx-resource-bot", "botId"), ("solution", "subscriptionId")]);
}

#[tokio::test]
async fn test_sqlite_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let repo = sqlite_repo(&dir).await;
    assert_set_and_get(&repo).await;
}

#[tokio::test]
async fn test_sqlite_save_replaces_section() {
    let dir = tempfile::tempdir().unwrap();
    let repo = sqlite_repo(&dir).await;
    assert_save_replaces_section(&repo).await;
}

#[tokio::test]
async fn test_sqlite_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    {
        let repo = sqlite_repo(&dir).await;
        repo.set("dev", "solution", "location", "eastus").await.unwrap();
    }
    let repo = sqlite_repo(&dir).await;
    let value = repo.get("dev", "solution", "location").await.unwrap();
    assert_eq!(value.as_deref(), Some("eastus"));
}

#[tokio::test]
async fn test_sqlite_load_missing_section_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let repo = sqlite_repo(&dir).await;
    let loaded = repo.load("dev", "nothing").await.unwrap();
    assert!(loaded.is_empty());
}

#[tokio::test]
async fn test_memory_set_and_get() {
    let repo = InMemoryConfigRepository::new();
    assert_set_and_get(&repo).await;
}

#[tokio::test]
async fn test_memory_save_replaces_section() {
    let repo = InMemoryConfigRepository::new();
    assert_save_replaces_section(&repo).await;
}
