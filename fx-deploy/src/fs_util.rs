use std::io;
use std::path::{Component, Path};
use std::time::{SystemTime, UNIX_EPOCH};

use fx_core::FxError;

/// Writes through a sibling temp file and renames it over `path`.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await
}

pub(crate) fn system_time_ms(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        Err(e) => -(e.duration().as_millis() as i64),
    }
}

pub(crate) fn modified_ms(metadata: &std::fs::Metadata) -> io::Result<i64> {
    metadata.modified().map(system_time_ms)
}

pub(crate) fn to_slash(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub(crate) fn join_error(e: tokio::task::JoinError) -> FxError {
    FxError::Io(io::Error::other(e.to_string()))
}
