use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::db::{PostStore, StoreError};
use super::models::{NewPost, PostRecord};

/// `id` is cast because tables created with SERIAL hold INT4 ids.
const SELECT_POST: &str = "SELECT id::BIGINT AS id, andrewid, username, content, created_at, \
     verified, approved FROM posts";

pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await?;

        let database: String = sqlx::query_scalar("SELECT current_database()")
            .fetch_one(&pool)
            .await?;
        tracing::info!(database = %database, "Connected to PostgreSQL");

        Ok(Self { pool })
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn migrate(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS posts (
                id SERIAL PRIMARY KEY,
                andrewid VARCHAR(8) NOT NULL,
                username VARCHAR(30) NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                verified BOOLEAN NOT NULL DEFAULT false,
                approved BOOLEAN NOT NULL DEFAULT false,
                approved_at TIMESTAMPTZ
            )",
        )
        .execute(&mut *tx)
        .await?;

        // Older revisions of the table predate these columns.
        for ddl in [
            "ALTER TABLE posts ADD COLUMN IF NOT EXISTS content TEXT NOT NULL DEFAULT ''",
            "ALTER TABLE posts ADD COLUMN IF NOT EXISTS verified BOOLEAN NOT NULL DEFAULT false",
            "ALTER TABLE posts ADD COLUMN IF NOT EXISTS approved BOOLEAN NOT NULL DEFAULT false",
            "ALTER TABLE posts ADD COLUMN IF NOT EXISTS approved_at TIMESTAMPTZ",
        ] {
            sqlx::query(ddl).execute(&mut *tx).await?;
        }

        let created_at_type: Option<String> = sqlx::query_scalar(
            "SELECT data_type::TEXT FROM information_schema.columns
             WHERE table_schema = current_schema()
               AND table_name = 'posts' AND column_name = 'created_at'",
        )
        .fetch_optional(&mut *tx)
        .await?;

        match created_at_type.as_deref() {
            Some("timestamp with time zone") => {}
            Some("timestamp without time zone") => {
                tracing::info!("Converting posts.created_at to TIMESTAMPTZ");
                sqlx::query(
                    "ALTER TABLE posts ALTER COLUMN created_at TYPE TIMESTAMPTZ
                     USING created_at AT TIME ZONE 'UTC'",
                )
                .execute(&mut *tx)
                .await?;
                sqlx::query("ALTER TABLE posts ALTER COLUMN created_at SET DEFAULT now()")
                    .execute(&mut *tx)
                    .await?;
            }
            other => {
                return Err(StoreError::Migration(format!(
                    "posts.created_at has unexpected type {other:?}"
                )));
            }
        }

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS posts_andrewid_created_at_idx
             ON posts (andrewid, created_at DESC)",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn insert_post(&self, post: &NewPost) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (andrewid, username, content, created_at, verified, approved)
             VALUES ($1, $2, $3, $4, false, false)
             RETURNING id::BIGINT",
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
            "{SELECT_POST} WHERE andrewid = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(andrew_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn get_post(&self, id: i64) -> Result<Option<PostRecord>, StoreError> {
        let post = sqlx::query_as::<_, PostRecord>(&format!("{SELECT_POST} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
