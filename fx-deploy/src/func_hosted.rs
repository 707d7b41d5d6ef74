//! Functions-hosted deployment: per-environment records and an archive cache.
//!
//! The cache is the zip uploaded by the last successful deploy. When packing again,
//! an entry is copied from the cache as-is if its timestamp matches the file on disk
//! at zip resolution and is newer than [`LATEST_TRUST_MTIME_MS`]; everything else is
//! read from disk concurrently. Entries whose files disappeared are not carried over.

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Write};
use std::path::PathBuf;

use futures::future::try_join_all;
use fx_core::{FxError, FxResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::{ZipArchive, ZipWriter};

use crate::archive::{entry_options, from_zip_time, same_zip_time, zip_error, LATEST_TRUST_MTIME_MS};
use crate::fs_util::{join_error, modified_ms, to_slash, write_atomic};
use crate::ignore_rules::IgnoreMatcher;
use crate::{
    DEFAULT_IGNORE_RULES, DEPLOYMENT_FOLDER, DEPLOYMENT_INFO_FILE, DEPLOYMENT_ZIP_CACHE_FILE,
};

const GIT_IGNORE_FILE: &str = ".gitignore";
const DEFAULT_IGNORE: &[&str] = &["node_modules"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct EnvDeployment {
    time: i64,
}

type DeploymentInfo = BTreeMap<String, EnvDeployment>;

/// A file selected for packaging.
#[derive(Debug, Clone)]
struct PackFile {
    name: String,
    path: PathBuf,
    mtime: i64,
}

/// Archive bytes plus which entries came from the cache and which from disk.
#[derive(Debug, Clone, Default)]
pub struct PackResult {
    pub bytes: Vec<u8>,
    pub reused: Vec<String>,
    pub loaded: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FuncHostedDeployMgr {
    working_dir: PathBuf,
    env_name: String,
}

impl FuncHostedDeployMgr {
    pub fn new(working_dir: impl Into<PathBuf>, env_name: impl Into<String>) -> Self {
        Self {
            working_dir: working_dir.into(),
            env_name: env_name.into(),
        }
    }

    fn deployment_dir(&self) -> PathBuf {
        self.working_dir.join(DEPLOYMENT_FOLDER)
    }

    fn info_path(&self) -> PathBuf {
        self.deployment_dir().join(DEPLOYMENT_INFO_FILE)
    }

    fn cache_path(&self) -> PathBuf {
        self.deployment_dir().join(DEPLOYMENT_ZIP_CACHE_FILE)
    }

    /// Creates the deployment folder and `{ env: { time: 0 } }` when no record exists.
    /// Bookkeeping failures are logged; the next deploy then runs in full.
    pub async fn init(&self) -> FxResult<()> {
        let dir = self.deployment_dir();
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!(dir = %dir.display(), error = %e, "failed to create deployment folder");
            return Ok(());
        }
        let info_path = self.info_path();
        if tokio::fs::try_exists(&info_path).await.unwrap_or(false) {
            return Ok(());
        }
        let mut info = DeploymentInfo::new();
        info.insert(self.env_name.clone(), EnvDeployment { time: 0 });
        let result = match serde_json::to_vec(&info) {
            Ok(bytes) => write_atomic(&info_path, &bytes).await,
            Err(e) => Err(std::io::Error::other(e)),
        };
        if let Err(e) = result {
            warn!(path = %info_path.display(), error = %e, "failed to write deployment info");
        }
        Ok(())
    }

    /// Writes a default ignore file with `file_name` unless one exists.
    pub async fn ensure_ignore_file(&self, file_name: &str) -> FxResult<()> {
        let path = self.working_dir.join(file_name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }
        let mut content = DEFAULT_IGNORE_RULES.join("\n");
        content.push('\n');
        match tokio::fs::write(&path, content).await {
            Ok(()) => info!(path = %path.display(), "default ignore file created"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to create ignore file"),
        }
        Ok(())
    }

    /// Trimmed lines of `file_name` in the working directory; empty when absent.
    pub async fn get_ignore_rules(&self, file_name: &str) -> Vec<String> {
        match tokio::fs::read_to_string(self.working_dir.join(file_name)).await {
            Ok(content) => content.lines().map(|l| l.trim().to_string()).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Errors are answered with `true` so a needed deploy is never skipped.
    pub async fn needs_to_redeploy(&self, ignore_rules: &[String]) -> bool {
        match self.find_change(ignore_rules).await {
            Ok(Some(name)) => {
                info!(file = %name, env = %self.env_name, "change detected since last deploy");
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "change detection failed, redeploying");
                true
            }
        }
    }

    async fn find_change(&self, ignore_rules: &[String]) -> FxResult<Option<String>> {
        let last = self.read_last_deploy_time().await?;
        let root = self.working_dir.clone();
        let default = IgnoreMatcher::new(&root, DEFAULT_IGNORE)?;
        let host = IgnoreMatcher::new(&root, ignore_rules)?;
        let git_rules = self.get_ignore_rules(GIT_IGNORE_FILE).await;
        let git = IgnoreMatcher::new(&root, git_rules.as_slice())?;

        tokio::task::spawn_blocking(move || -> FxResult<Option<String>> {
            let walker = WalkDir::new(&root)
                .min_depth(1)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| match e.path().strip_prefix(&root) {
                    Ok(rel) => !default.is_ignored(rel, e.file_type().is_dir()),
                    Err(_) => false,
                });
            for entry in walker {
                let entry = entry.map_err(|e| FxError::Io(std::io::Error::other(e.to_string())))?;
                let rel = entry
                    .path()
                    .strip_prefix(&root)
                    .map_err(|e| FxError::Io(std::io::Error::other(e.to_string())))?;
                let is_dir = entry.file_type().is_dir();
                if host.is_ignored(rel, is_dir) && git.is_ignored(rel, is_dir) {
                    continue;
                }
                let metadata = entry
                    .metadata()
                    .map_err(|e| FxError::Io(std::io::Error::other(e.to_string())))?;
                if modified_ms(&metadata)? > last {
                    return Ok(Some(to_slash(rel)));
                }
            }
            Ok(None)
        })
        .await
        .map_err(join_error)?
    }

    async fn read_info(&self) -> FxResult<DeploymentInfo> {
        let bytes = tokio::fs::read(self.info_path()).await?;
        serde_json::from_slice(&bytes).map_err(|e| FxError::Io(std::io::Error::other(e)))
    }

    async fn read_last_deploy_time(&self) -> FxResult<i64> {
        let info = self.read_info().await?;
        info.get(&self.env_name)
            .map(|d| d.time)
            .ok_or_else(|| FxError::MissingResource(format!("deployment info of {}", self.env_name)))
    }

    /// The recorded time of this environment, or 0 when unavailable.
    pub async fn get_last_deploy_time(&self) -> i64 {
        self.read_last_deploy_time().await.unwrap_or(0)
    }

    pub async fn zip_a_folder(&self, ignore_rules: &[String]) -> FxResult<Vec<u8>> {
        Ok(self.pack(ignore_rules).await?.bytes)
    }

    /// Builds the payload, reusing unchanged entries of the cached archive.
    pub async fn pack(&self, ignore_rules: &[String]) -> FxResult<PackResult> {
        let matcher = IgnoreMatcher::new(&self.working_dir, ignore_rules)?;
        let files = collect_files(self.working_dir.clone(), matcher).await?;
        let mut cache = self.load_cache().await;

        let (reused, to_load): (Vec<&PackFile>, Vec<&PackFile>) = files
            .iter()
            .partition(|f| cache.as_mut().is_some_and(|c| is_reusable(c, f)));

        let contents = try_join_all(to_load.iter().map(|f| async move {
            tokio::fs::read(&f.path).await.map(|bytes| (f.name.clone(), bytes))
        }))
        .await?;
        let mut loaded: HashMap<String, Vec<u8>> = contents.into_iter().collect();

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for file in &files {
            if let Some(bytes) = loaded.remove(&file.name) {
                writer
                    .start_file(file.name.as_str(), entry_options(file.mtime))
                    .map_err(zip_error)?;
                writer.write_all(&bytes)?;
            } else if let Some(archive) = cache.as_mut() {
                let entry = archive.by_name(&file.name).map_err(zip_error)?;
                writer.raw_copy_file(entry).map_err(zip_error)?;
            }
        }
        let bytes = writer.finish().map_err(zip_error)?.into_inner();

        let result = PackResult {
            bytes,
            reused: reused.iter().map(|f| f.name.clone()).collect(),
            loaded: to_load.iter().map(|f| f.name.clone()).collect(),
        };
        info!(
            files = files.len(),
            reused = result.reused.len(),
            loaded = result.loaded.len(),
            size = result.bytes.len(),
            "deployment package built"
        );
        Ok(result)
    }

    async fn load_cache(&self) -> Option<ZipArchive<Cursor<Vec<u8>>>> {
        let bytes = match tokio::fs::read(self.cache_path()).await {
            Ok(b) => b,
            Err(e) => {
                debug!(error = %e, "no archive cache");
                return None;
            }
        };
        match ZipArchive::new(Cursor::new(bytes)) {
            Ok(archive) => Some(archive),
            Err(e) => {
                warn!(error = %e, "archive cache unreadable, packing from scratch");
                None
            }
        }
    }

    /// Records `time` for this environment and stores `zip` as the next cache.
    /// Failures are logged and swallowed.
    pub async fn save_deployment_info(&self, zip: &[u8], time: i64) {
        if let Err(e) = tokio::fs::create_dir_all(self.deployment_dir()).await {
            warn!(error = %e, "failed to create deployment folder");
            return;
        }

        let mut info = self.read_info().await.unwrap_or_default();
        info.insert(self.env_name.clone(), EnvDeployment { time });
        let written = match serde_json::to_vec(&info) {
            Ok(bytes) => write_atomic(&self.info_path(), &bytes).await,
            Err(e) => Err(std::io::Error::other(e)),
        };
        if let Err(e) = written {
            warn!(error = %e, "failed to save deployment info");
        }

        if let Err(e) = write_atomic(&self.cache_path(), zip).await {
            warn!(error = %e, "failed to save archive cache");
        }
    }
}

fn is_reusable(cache: &mut ZipArchive<Cursor<Vec<u8>>>, file: &PackFile) -> bool {
    let Ok(entry) = cache.by_name(&file.name) else {
        return false;
    };
    match from_zip_time(entry.last_modified()) {
        Some(cached) => cached >= LATEST_TRUST_MTIME_MS && same_zip_time(cached, file.mtime),
        None => false,
    }
}

async fn collect_files(root: PathBuf, matcher: IgnoreMatcher) -> FxResult<Vec<PackFile>> {
    tokio::task::spawn_blocking(move || -> FxResult<Vec<PackFile>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| match e.path().strip_prefix(&root) {
                Ok(rel) => !matcher.is_ignored(rel, e.file_type().is_dir()),
                Err(_) => false,
            });
        for entry in walker {
            let entry = entry.map_err(|e| FxError::Io(std::io::Error::other(e.to_string())))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let metadata = entry
                .metadata()
                .map_err(|e| FxError::Io(std::io::Error::other(e.to_string())))?;
            let name = match entry.path().strip_prefix(&root) {
                Ok(rel) => to_slash(rel),
                Err(_) => continue,
            };
            files.push(PackFile {
                name,
                mtime: modified_ms(&metadata)?,
                path: entry.into_path(),
            });
        }
        Ok(files)
    })
    .await
    .map_err(join_error)?
}
