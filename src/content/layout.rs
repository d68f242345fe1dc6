use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::ContentError;

/// `{root}/{andrew_id}/{unix_seconds}`
pub fn post_dir_path(
    root: &Path,
    andrew_id: &str,
    at: DateTime<Utc>,
) -> Result<PathBuf, ContentError> {
    if !is_safe_component(andrew_id) {
        return Err(ContentError::InvalidName(andrew_id.to_string()));
    }
    Ok(root.join(andrew_id).join(at.timestamp().to_string()))
}

/// A single, non-special path segment: no separators, not `.` or `..`.
pub fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(unix)]
pub(super) async fn create_dir_all(dir: &Path) -> Result<(), std::io::Error> {
    tokio::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(dir)
        .await
}

#[cfg(not(unix))]
pub(super) async fn create_dir_all(dir: &Path) -> Result<(), std::io::Error> {
    tokio::fs::create_dir_all(dir).await
}
