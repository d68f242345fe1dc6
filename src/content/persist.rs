use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use super::{is_safe_component, ContentError};

/// Write a small text file (caption, handle) into a submission directory.
pub async fn write_text(dir: &Path, name: &str, text: &str) -> Result<(), ContentError> {
    if !is_safe_component(name) {
        return Err(ContentError::InvalidName(name.to_string()));
    }
    tokio::fs::write(dir.join(name), text.as_bytes()).await?;
    Ok(())
}

/// Remove a submission directory and everything in it. A missing directory is fine.
pub async fn discard(dir: &Path) -> Result<(), ContentError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Writes accepted media into a submission directory as `0.ext`, `1.ext`, ...
///
/// The index advances only when a write succeeds, so dropped slots never
/// leave gaps in the sequence.
#[derive(Debug)]
pub struct MediaWriter {
    dir: PathBuf,
    next_index: usize,
}

impl MediaWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next_index: 0,
        }
    }

    /// Stream `chunks` into the next sequential file. `extension` includes the dot.
    pub async fn write<I, B>(&mut self, extension: &str, chunks: I) -> Result<PathBuf, ContentError>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let name = format!("{}{extension}", self.next_index);
        if !is_safe_component(&name) {
            return Err(ContentError::InvalidName(name));
        }

        let path = self.dir.join(&name);
        let mut file = tokio::fs::File::create(&path).await?;
        for chunk in chunks {
            file.write_all(chunk.as_ref()).await?;
        }
        file.flush().await?;

        self.next_index += 1;
        Ok(path)
    }

    /// Number of files written so far.
    pub fn count(&self) -> usize {
        self.next_index
    }
}
