use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the `posts` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: i64,
    #[sqlx(rename = "andrewid")]
    pub andrew_id: String,
    /// Display name as typed by the submitter
    pub username: String,
    /// Submission directory on disk. Nothing enforces that it still exists.
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub verified: bool,
    pub approved: bool,
}

/// Values for a new `posts` row. `verified` and `approved` always start out false.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub andrew_id: String,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
