//! Zip packaging helpers and the timestamp rules of the archive cache.

use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Timelike, Utc};
use fx_core::{FxError, FxResult};
use tracing::debug;
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::fs_util::{join_error, modified_ms, to_slash};

/// Zip timestamps have a resolution of two seconds.
pub const ZIP_TIME_GRANULARITY_MS: i64 = 2000;

/// 2000-02-01T00:00:00Z. Cached entries older than this carry timestamps that
/// cannot be trusted (package managers reset them) and are always refreshed.
pub const LATEST_TRUST_MTIME_MS: i64 = 949_363_200_000;

pub(crate) fn zip_error(e: ZipError) -> FxError {
    FxError::Io(io::Error::other(e.to_string()))
}

/// Compares two timestamps at zip resolution.
pub fn same_zip_time(a_ms: i64, b_ms: i64) -> bool {
    a_ms.div_euclid(ZIP_TIME_GRANULARITY_MS) == b_ms.div_euclid(ZIP_TIME_GRANULARITY_MS)
}

// 按 UTC 存储；超出范围回退到 zip 纪元 1980-01-01
pub(crate) fn to_zip_time(ms: i64) -> DateTime {
    chrono::DateTime::<Utc>::from_timestamp_millis(ms)
        .and_then(|t| {
            DateTime::from_date_and_time(
                u16::try_from(t.year()).ok()?,
                t.month() as u8,
                t.day() as u8,
                t.hour() as u8,
                t.minute() as u8,
                t.second() as u8,
            )
            .ok()
        })
        .unwrap_or_default()
}

pub(crate) fn from_zip_time(time: DateTime) -> Option<i64> {
    NaiveDate::from_ymd_opt(time.year() as i32, time.month() as u32, time.day() as u32)?
        .and_hms_opt(time.hour() as u32, time.minute() as u32, time.second() as u32)
        .map(|t| t.and_utc().timestamp_millis())
}

pub(crate) fn entry_options(mtime_ms: i64) -> FileOptions {
    FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(to_zip_time(mtime_ms))
}

fn is_skipped(relative: &Path, skip: &[&str]) -> bool {
    skip.iter().any(|prefix| relative.starts_with(prefix))
}

/// Zips every file under `root`, leaving out the given relative path prefixes.
pub async fn zip_directory(root: &Path, skip: &[&str]) -> FxResult<Vec<u8>> {
    let root: PathBuf = root.to_path_buf();
    let skip: Vec<String> = skip.iter().map(|s| s.to_string()).collect();
    tokio::task::spawn_blocking(move || {
        let skip: Vec<&str> = skip.iter().map(String::as_str).collect();
        zip_directory_blocking(&root, &skip)
    })
    .await
    .map_err(join_error)?
}

fn zip_directory_blocking(root: &Path, skip: &[&str]) -> FxResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut count = 0usize;

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.path()
                .strip_prefix(root)
                .map(|rel| !is_skipped(rel, skip))
                .unwrap_or(false)
        });

    for entry in walker {
        let entry = entry.map_err(|e| FxError::Io(io::Error::other(e.to_string())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| FxError::Io(io::Error::other(e.to_string())))?;
        let mtime = modified_ms(&entry.metadata().map_err(|e| FxError::Io(io::Error::other(e.to_string())))?)?;
        let bytes = std::fs::read(entry.path())?;

        writer
            .start_file(to_slash(relative), entry_options(mtime))
            .map_err(zip_error)?;
        writer.write_all(&bytes)?;
        count += 1;
    }

    let bytes = writer.finish().map_err(zip_error)?.into_inner();
    debug!(root = %root.display(), files = count, size = bytes.len(), "folder zipped");
    Ok(bytes)
}
