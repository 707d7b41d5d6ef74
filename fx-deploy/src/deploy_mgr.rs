//! Classic deployment bookkeeping: one `{ time }` record per working directory.

use std::path::{Path, PathBuf};

use fx_core::{FxError, FxResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::archive::zip_directory;
use crate::fs_util::{join_error, modified_ms, write_atomic};
use crate::{DEPLOYMENT_FOLDER, DEPLOYMENT_RECORD_FILE, PACKAGE_EXCLUDE_PATHS, WALK_SKIP_PATHS};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct DeploymentRecord {
    time: i64,
}

#[derive(Debug, Clone)]
pub struct DeployMgr {
    working_dir: Option<PathBuf>,
    skip_paths: Vec<String>,
}

impl DeployMgr {
    pub fn new(working_dir: Option<PathBuf>) -> Self {
        Self {
            working_dir,
            skip_paths: WALK_SKIP_PATHS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replaces the default walk-skip prefixes.
    pub fn with_skip_paths<S: Into<String>>(mut self, skip: impl IntoIterator<Item = S>) -> Self {
        self.skip_paths = skip.into_iter().map(Into::into).collect();
        self
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    fn deployment_dir(&self) -> Option<PathBuf> {
        self.working_dir.as_ref().map(|dir| dir.join(DEPLOYMENT_FOLDER))
    }

    fn record_path(&self) -> Option<PathBuf> {
        self.deployment_dir().map(|dir| dir.join(DEPLOYMENT_RECORD_FILE))
    }

    /// Creates the deployment folder and a zero record when none exists.
    pub async fn init(&self) -> FxResult<()> {
        let dir = self
            .deployment_dir()
            .ok_or_else(|| FxError::MissingResource(DEPLOYMENT_FOLDER.to_string()))?;
        let record = dir.join(DEPLOYMENT_RECORD_FILE);

        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!(dir = %dir.display(), error = %e, "failed to create deployment folder");
            return Ok(());
        }
        if tokio::fs::try_exists(&record).await.unwrap_or(false) {
            return Ok(());
        }
        self.write_record(&record, 0).await;
        Ok(())
    }

    /// True when any non-skipped entry was modified after the last recorded deploy.
    pub async fn needs_to_redeploy(&self) -> FxResult<bool> {
        let root = self
            .working_dir
            .clone()
            .ok_or_else(|| FxError::Precondition("The bot working directory is not set".to_string()))?;
        let last = self.get_last_deploy_time().await;
        let skip = self.skip_paths.clone();

        let changed = tokio::task::spawn_blocking(move || find_newer_entry(&root, &skip, last))
            .await
            .map_err(join_error)??;

        match changed {
            Some(path) => {
                info!(path = %path.display(), last_deploy_time = last, "change detected since last deploy");
                Ok(true)
            }
            None => {
                debug!(last_deploy_time = last, "no change since last deploy");
                Ok(false)
            }
        }
    }

    /// Failures are logged, never returned.
    pub async fn update_last_deploy_time(&self, time: i64) {
        match self.record_path() {
            Some(path) => self.write_record(&path, time).await,
            None => warn!("working directory not set, deploy time not recorded"),
        }
    }

    /// The recorded time, or 0 when the record is missing or malformed.
    pub async fn get_last_deploy_time(&self) -> i64 {
        let Some(path) = self.record_path() else {
            return 0;
        };
        let content = match tokio::fs::read(&path).await {
            Ok(c) => c,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "deployment record unreadable");
                return 0;
            }
        };
        match serde_json::from_slice::<DeploymentRecord>(&content) {
            Ok(record) => record.time,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "deployment record malformed");
                0
            }
        }
    }

    /// Zips the working directory for App Service hosting. `skip` prefixes, the deployment
    /// folder and [`PACKAGE_EXCLUDE_PATHS`] are left out.
    pub async fn zip_folder(&self, skip: &[&str]) -> FxResult<Vec<u8>> {
        let root = self
            .working_dir
            .as_deref()
            .ok_or_else(|| FxError::Precondition("The bot working directory is not set".to_string()))?;
        let mut excluded: Vec<&str> = skip.to_vec();
        excluded.push(DEPLOYMENT_FOLDER);
        excluded.extend_from_slice(PACKAGE_EXCLUDE_PATHS);
        zip_directory(root, &excluded).await
    }

    async fn write_record(&self, path: &Path, time: i64) {
        let result = match serde_json::to_vec(&DeploymentRecord { time }) {
            Ok(bytes) => write_atomic(path, &bytes).await,
            Err(e) => Err(std::io::Error::other(e)),
        };
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "failed to write deployment record");
        }
    }
}

fn find_newer_entry(root: &Path, skip: &[String], last: i64) -> FxResult<Option<PathBuf>> {
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| match e.path().strip_prefix(root) {
            Ok(rel) => !skip.iter().any(|prefix| rel.starts_with(prefix)),
            Err(_) => false,
        });

    for entry in walker {
        let entry = entry.map_err(|e| FxError::Io(std::io::Error::other(e.to_string())))?;
        let metadata = entry
            .metadata()
            .map_err(|e| FxError::Io(std::io::Error::other(e.to_string())))?;
        if modified_ms(&metadata)? > last {
            return Ok(Some(entry.into_path()));
        }
    }
    Ok(None)
}
