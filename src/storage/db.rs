use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::models::{NewPost, PostRecord};
use super::{PgPostStore, SqlitePostStore};
use crate::config::{DatabaseBackend, DatabaseConfig};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Relational store for post metadata.
///
/// Only simple parameterized statements go through here; the row's
/// `content` column is the sole link to the files on disk.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Create the `posts` table, or bring an older revision of it up to date.
    async fn migrate(&self) -> Result<(), StoreError>;

    /// Insert a post and return the id the store assigned.
    async fn insert_post(&self, post: &NewPost) -> Result<i64, StoreError>;

    /// All posts for one identity, newest first.
    async fn list_by_andrew_id(&self, andrew_id: &str) -> Result<Vec<PostRecord>, StoreError>;

    async fn get_post(&self, id: i64) -> Result<Option<PostRecord>, StoreError>;

    /// Close the underlying pool, waiting for checked-out connections.
    async fn close(&self);
}

/// Connect to the configured backend. The schema is not touched; call `migrate`.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn PostStore>, StoreError> {
    let store: Arc<dyn PostStore> = match config.backend {
        DatabaseBackend::Postgres => {
            Arc::new(PgPostStore::connect(&config.url, config.max_connections).await?)
        }
        DatabaseBackend::Sqlite => {
            Arc::new(SqlitePostStore::connect(&config.url, config.max_connections).await?)
        }
    };
    Ok(store)
}
