use chrono::{Duration, TimeZone, Utc};
use cmuinsta::storage::models::NewPost;
use cmuinsta::storage::{PostStore, SqlitePostStore};

async fn test_store() -> (tempfile::TempDir, SqlitePostStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqlitePostStore::open(dir.path().join("posts.db"))
        .await
        .unwrap();
    store.migrate().await.unwrap();
    (dir, store)
}

fn sample_post(andrew_id: &str, content: &str) -> NewPost {
    NewPost {
        andrew_id: andrew_id.to_string(),
        username: "Test User".to_string(),
        content: content.to_string(),
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn test_insert_and_get_post() {
    let (_dir, store) = test_store().await;

    let id = store
        .insert_post(&sample_post("abc123", "/store/abc123/1740830400"))
        .await
        .unwrap();

    let post = store.get_post(id).await.unwrap().expect("post should exist");
    assert_eq!(post.id, id);
    assert_eq!(post.andrew_id, "abc123");
    assert_eq!(post.username, "Test User");
    assert_eq!(post.content, "/store/abc123/1740830400");
    assert_eq!(
        post.created_at,
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    );
    assert!(!post.verified);
    assert!(!post.approved);
}

#[tokio::test]
async fn test_ids_are_distinct() {
    let (_dir, store) = test_store().await;

    let a = store.insert_post(&sample_post("abc123", "/a")).await.unwrap();
    let b = store.insert_post(&sample_post("abc123", "/b")).await.unwrap();

    assert_ne!(a, b);
    assert!(a > 0 && b > 0);
}

#[tokio::test]
async fn test_get_missing_post() {
    let (_dir, store) = test_store().await;
    assert!(store.get_post(42).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_filters_and_orders_newest_first() {
    let (_dir, store) = test_store().await;
    let base = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

    for (andrew_id, offset, content) in [
        ("abc123", 0, "/oldest"),
        ("xyz789", 5, "/other"),
        ("abc123", 20, "/newest"),
        ("abc123", 10, "/middle"),
    ] {
        let mut post = sample_post(andrew_id, content);
        post.created_at = base + Duration::seconds(offset);
        store.insert_post(&post).await.unwrap();
    }

    let posts = store.list_by_andrew_id("abc123").await.unwrap();
    let contents: Vec<&str> = posts.iter().map(|p| p.content.as_str()).collect();
    assert_eq!(contents, vec!["/newest", "/middle", "/oldest"]);

    assert!(store.list_by_andrew_id("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_column_widths_are_enforced() {
    let (_dir, store) = test_store().await;

    let mut post = sample_post("abcdefghi", "/a");
    assert!(store.insert_post(&post).await.is_err());

    post.andrew_id = "abcdefgh".to_string();
    post.username = "n".repeat(31);
    assert!(store.insert_post(&post).await.is_err());

    post.username = "n".repeat(30);
    assert!(store.insert_post(&post).await.is_ok());
}

#[tokio::test]
async fn test_migrate_is_idempotent() {
    let (_dir, store) = test_store().await;

    let id = store.insert_post(&sample_post("abc123", "/a")).await.unwrap();
    store.migrate().await.unwrap();

    assert!(store.get_post(id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_reopen_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("posts.db");

    let id = {
        let store = SqlitePostStore::open(&path).await.unwrap();
        store.migrate().await.unwrap();
        let id = store.insert_post(&sample_post("abc123", "/a")).await.unwrap();
        store.close().await;
        id
    };

    let store = SqlitePostStore::open(&path).await.unwrap();
    store.migrate().await.unwrap();
    assert_eq!(store.get_post(id).await.unwrap().unwrap().content, "/a");
}
