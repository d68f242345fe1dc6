use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use super::db::{PostStore, StoreError};
use super::models::{NewPost, PostRecord};

const SELECT_POST: &str =
    "SELECT id, andrewid, username, content, created_at, verified, approved FROM posts";

/// SQLite-backed store for local development and tests.
pub struct SqlitePostStore {
    pool: SqlitePool,
}

impl SqlitePostStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        tracing::info!(url = %url, "Opened SQLite database");
        Ok(Self { pool })
    }

    /// Open (or create) a database file at `path`.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl PostStore for SqlitePostStore {
    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                andrewid VARCHAR(8) NOT NULL CHECK (length(andrewid) <= 8),
                username VARCHAR(30) NOT NULL CHECK (length(username) <= 30),
                content TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                verified BOOLEAN NOT NULL DEFAULT 0,
                approved BOOLEAN NOT NULL DEFAULT 0,
                approved_at TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS posts_andrewid_created_at_idx
             ON posts (andrewid, created_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_post(&self, post: &NewPost) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (andrewid, username, content, created_at, verified, approved)
             VALUES (?1, ?2, ?3, ?4, 0, 0)
             RETURNING id",
        )
        .bind(&post.andrew_id)
        .bind(&post.username)
        .bind(&post.content)
        .bind(post.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn list_by_andrew_id(&self, andrew_id: &str) -> Result<Vec<PostRecord>, StoreError> {
        let posts = sqlx::query_as::<_, PostRecord>(&format!(
            "{SELECT_POST} WHERE andrewid = ?1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(andrew_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn get_post(&self, id: i64) -> Result<Option<PostRecord>, StoreError> {
        let post = sqlx::query_as::<_, PostRecord>(&format!("{SELECT_POST} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
