//! In-process configuration repository, used by tests and dry runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::{ConfigEntry, ConfigMap};
use crate::repository::ConfigRepository;

type SectionKey = (String, String);

#[derive(Default)]
pub struct InMemoryConfigRepository {
    sections: Mutex<HashMap<SectionKey, ConfigMap>>,
}

impl InMemoryConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_sections<R>(
        &self,
        f: impl FnOnce(&mut HashMap<SectionKey, ConfigMap>) -> R,
    ) -> Result<R, StorageError> {
        let mut sections = self
            .sections
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        Ok(f(&mut sections))
    }
}

fn section_key(env: &str, plugin: &str) -> SectionKey {
    (env.to_string(), plugin.to_string())
}

#[async_trait]
impl ConfigRepository for InMemoryConfigRepository {
    async fn get(&self, env: &str, plugin: &str, key: &str) -> Result<Option<String>, StorageError> {
        self.with_sections(|s| {
            s.get(&section_key(env, plugin))
                .and_then(|section| section.get_string(key))
        })
    }

    async fn set(&self, env: &str, plugin: &str, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_sections(|s| {
            s.entry(section_key(env, plugin))
                .or_default()
                .set(key, value)
        })
    }

    async fn load(&self, env: &str, plugin: &str) -> Result<ConfigMap, StorageError> {
        self.with_sections(|s| s.get(&section_key(env, plugin)).cloned().unwrap_or_default())
    }

    async fn save(&self, env: &str, plugin: &str, config: &ConfigMap) -> Result<(), StorageError> {
        self.with_sections(|s| {
            s.insert(section_key(env, plugin), config.clone());
        })
    }

    async fn entries(&self, env: &str) -> Result<Vec<ConfigEntry>, StorageError> {
        self.with_sections(|s| {
            let mut entries: Vec<ConfigEntry> = s
                .iter()
                .filter(|((e, _), _)| e == env)
                .flat_map(|((e, plugin), section)| {
                    section
                        .iter()
                        .map(|(k, v)| ConfigEntry::new(e, plugin, k, v))
                        .collect::<Vec<_>>()
                })
                .collect();
            entries.sort_by(|a, b| (&a.plugin, &a.key).cmp(&(&b.plugin, &b.key)));
            entries
        })
    }
}
