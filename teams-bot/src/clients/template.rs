//! Template archives: download with local fallback, placeholder replacement and extraction.

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use fx_core::{FxError, FxResult, ProgrammingLanguage};
use tracing::{debug, info, warn};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use super::http::trim_base;
use crate::config::DEFAULT_TEMPLATE_BASE_URL;
use crate::constants::{BOT_ID_PLACEHOLDER, BOT_PASSWORD_PLACEHOLDER};

pub const TEMPLATE_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(20);

/// `<group>.<lang>.default.zip`
pub fn template_file_name(group: &str, language: ProgrammingLanguage) -> String {
    format!("{}.{}.default.zip", group, language.template_tag())
}

#[async_trait]
pub trait TemplateProvider: Send + Sync {
    /// Archive bytes of the project template for `group` in `language`.
    async fn fetch(&self, group: &str, language: ProgrammingLanguage) -> FxResult<Vec<u8>>;
}

/// Downloads from the release site, falling back to archives bundled on disk.
#[derive(Debug, Clone)]
pub struct HttpTemplateProvider {
    http: reqwest::Client,
    base: String,
    fallback_dir: PathBuf,
}

impl Default for HttpTemplateProvider {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE_BASE_URL, "./templates")
    }
}

impl HttpTemplateProvider {
    pub fn new(base: &str, fallback_dir: impl Into<PathBuf>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(TEMPLATE_DOWNLOAD_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            base: trim_base(base),
            fallback_dir: fallback_dir.into(),
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, String> {
        let response = self.http.get(url).send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }
        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl TemplateProvider for HttpTemplateProvider {
    async fn fetch(&self, group: &str, language: ProgrammingLanguage) -> FxResult<Vec<u8>> {
        let file_name = template_file_name(group, language);
        let url = format!("{}/{}", self.base, file_name);

        let download_error = match self.download(&url).await {
            Ok(bytes) => {
                info!(url = %url, size = bytes.len(), "template downloaded");
                return Ok(bytes);
            }
            Err(e) => e,
        };
        warn!(url = %url, error = %download_error, "template download failed, using local archive");

        let local = self.fallback_dir.join(&file_name);
        tokio::fs::read(&local)
            .await
            .map_err(|e| FxError::TemplateZipFallback {
                group: group.to_string(),
                message: format!(
                    "download failed ({}), local archive {} unreadable ({})",
                    download_error,
                    local.display(),
                    e
                ),
            })
    }
}

/// `{BOT_ID}` and `{BOT_PASSWORD}` values written into the language config files.
#[derive(Debug, Clone)]
pub struct BotPlaceholders {
    pub bot_id: String,
    pub bot_password: String,
}

impl BotPlaceholders {
    pub fn apply(&self, content: &str) -> String {
        content
            .replace(BOT_ID_PLACEHOLDER, &self.bot_id)
            .replace(BOT_PASSWORD_PLACEHOLDER, &self.bot_password)
    }
}

fn unzip_error(dest: &Path, e: impl std::fmt::Display) -> FxError {
    FxError::Unzip {
        path: dest.display().to_string(),
        message: e.to_string(),
    }
}

/// Rewrites the named config entries of an archive.
///
/// Every name in `config_files` must be present in the archive. Placeholders are only
/// replaced when `placeholders` is given.
pub fn prepare_template(
    archive: Vec<u8>,
    config_files: &[&str],
    placeholders: Option<&BotPlaceholders>,
) -> FxResult<Vec<u8>> {
    let mut reader = ZipArchive::new(Cursor::new(archive))
        .map_err(|e| FxError::Unzip {
            path: "template archive".to_string(),
            message: e.to_string(),
        })?;

    for name in config_files {
        if reader.by_name(name).is_err() {
            return Err(FxError::SomethingMissing(format!("{} inside zip", name)));
        }
    }
    let Some(placeholders) = placeholders else {
        return Ok(reader.into_inner().into_inner());
    };

    let archive_error = |e: zip::result::ZipError| FxError::Unzip {
        path: "template archive".to_string(),
        message: e.to_string(),
    };
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for i in 0..reader.len() {
        let mut entry = reader.by_index(i).map_err(archive_error)?;
        if !config_files.contains(&entry.name()) {
            writer.raw_copy_file(entry).map_err(archive_error)?;
            continue;
        }
        let name = entry.name().to_string();
        let mut content = String::new();
        entry.read_to_string(&mut content)?;
        let options = FileOptions::default().last_modified_time(entry.last_modified());
        drop(entry);

        writer.start_file(name.as_str(), options).map_err(archive_error)?;
        writer.write_all(placeholders.apply(&content).as_bytes())?;
        debug!(file = %name, "placeholders replaced in template");
    }
    Ok(writer.finish().map_err(archive_error)?.into_inner())
}

/// Extracts `archive` into `dest`, overwriting existing files. Returns the file count.
pub async fn extract_template(archive: Vec<u8>, dest: &Path) -> FxResult<usize> {
    let dest = dest.to_path_buf();
    let target = dest.clone();
    tokio::task::spawn_blocking(move || extract_blocking(archive, &target))
        .await
        .map_err(|e| unzip_error(&dest, e))?
}

fn extract_blocking(archive: Vec<u8>, dest: &Path) -> FxResult<usize> {
    let mut reader = ZipArchive::new(Cursor::new(archive)).map_err(|e| unzip_error(dest, e))?;
    std::fs::create_dir_all(dest).map_err(|e| unzip_error(dest, e))?;

    let mut files = 0;
    for i in 0..reader.len() {
        let mut entry = reader.by_index(i).map_err(|e| unzip_error(dest, e))?;
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            warn!(name = %entry.name(), "skipping template entry outside the target folder");
            continue;
        };
        let path = dest.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&path).map_err(|e| unzip_error(dest, e))?;
            continue;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| unzip_error(dest, e))?;
        }
        let mut out = std::fs::File::create(&path).map_err(|e| unzip_error(dest, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| unzip_error(dest, e))?;
        files += 1;
    }
    info!(dest = %dest.display(), files, "template extracted");
    Ok(files)
}

/// Replaces placeholders in config files already on disk under `working_dir`.
pub async fn replace_placeholders_on_disk(
    working_dir: &Path,
    config_files: &[&str],
    placeholders: &BotPlaceholders,
) -> FxResult<()> {
    for name in config_files {
        let path = working_dir.join(name);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FxError::SomethingMissing(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        tokio::fs::write(&path, placeholders.apply(&content)).await?;
        debug!(file = %path.display(), "placeholders replaced on disk");
    }
    Ok(())
}
