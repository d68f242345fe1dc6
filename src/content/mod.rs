//! The on-disk side of a submission.
//!
//! Every post owns one directory under the store root:
//!
//! ```text
//! {root}/{andrewId}/{unixSeconds}/
//!     caption.txt
//!     instagram.txt
//!     0.jpg, 1.mp4, ...   (up to 10 media files)
//! ```
//!
//! Directories are written once at submission time and only read afterwards.

mod layout;
mod persist;
mod reader;

pub use layout::{is_safe_component, post_dir_path};
pub use persist::{discard, write_text, MediaWriter};
pub use reader::{list_files, read_media, read_text};

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

pub const CAPTION_FILE: &str = "caption.txt";
pub const INSTAGRAM_FILE: &str = "instagram.txt";

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Invalid path component: {0:?}")]
    InvalidName(String),
}

/// The store root and the directory layout beneath it.
#[derive(Debug, Clone)]
pub struct ContentTree {
    root: PathBuf,
}

impl ContentTree {
    /// Create the store root if needed and resolve it to an absolute path.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(root.as_ref())?;
        let root = std::fs::canonicalize(root.as_ref())?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a submission by `andrew_id` at `at` lives. Does not touch the filesystem.
    pub fn post_dir(&self, andrew_id: &str, at: DateTime<Utc>) -> Result<PathBuf, ContentError> {
        post_dir_path(&self.root, andrew_id, at)
    }

    /// Compute and create the submission directory, ancestors included.
    ///
    /// Two submissions from one identity within the same second share a
    /// directory; their files overwrite each other.
    pub async fn create_post_dir(
        &self,
        andrew_id: &str,
        at: DateTime<Utc>,
    ) -> Result<PathBuf, ContentError> {
        let dir = self.post_dir(andrew_id, at)?;
        layout::create_dir_all(&dir).await?;
        Ok(dir)
    }
}
