use std::path::Path;

use bytes::Bytes;

use super::{is_safe_component, ContentError, CAPTION_FILE};

/// Read a text file from a submission directory; `None` if it can't be read.
pub async fn read_text(dir: &Path, name: &str) -> Option<String> {
    tokio::fs::read_to_string(dir.join(name)).await.ok()
}

/// File manifest of a submission directory: regular entries other than
/// the caption, sorted by name. An unreadable directory yields an empty list.
pub async fn list_files(dir: &Path) -> Vec<String> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "Could not list post directory");
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let is_dir = entry
                    .file_type()
                    .await
                    .map(|t| t.is_dir())
                    .unwrap_or(false);
                let name = entry.file_name().to_string_lossy().into_owned();
                if !is_dir && name != CAPTION_FILE {
                    files.push(name);
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "Stopped listing post directory");
                break;
            }
        }
    }

    files.sort();
    files
}

/// Load one media file from a submission directory.
pub async fn read_media(dir: &Path, name: &str) -> Result<Bytes, ContentError> {
    if !is_safe_component(name) {
        return Err(ContentError::InvalidName(name.to_string()));
    }

    match tokio::fs::read(dir.join(name)).await {
        Ok(data) => Ok(Bytes::from(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ContentError::NotFound(name.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
