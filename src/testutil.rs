//! Shared test helpers for in-crate router tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};

use crate::auth::{AdminList, OidcClient};
use crate::config::{
    Config, DatabaseBackend, DatabaseConfig, InstagramConfig, OidcConfig, ServerConfig,
    StorageConfig,
};
use crate::content::ContentTree;
use crate::instagram::ProfileChecker;
use crate::storage::{PostStore, SqlitePostStore};
use crate::AppState;

/// Create a test AppState with a temporary SQLite database and store root.
/// Upstream services point at an unroutable address.
pub async fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let db_path = temp_dir.path().join("posts.db");
    let store_dir = temp_dir.path().join("posts_store");

    let config = Config {
        admins: AdminList::parse("admin1,admin2"),
        database: DatabaseConfig {
            backend: DatabaseBackend::Sqlite,
            url: format!("sqlite:{}", db_path.display()),
            max_connections: 1,
        },
        instagram: InstagramConfig {
            base_url: "http://127.0.0.1:9".to_string(),
        },
        oidc: OidcConfig {
            issuer_url: "http://127.0.0.1:9/realms/test".to_string(),
            client_id: "cmuinsta".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:3000/callback".to_string(),
        },
        server: ServerConfig::default(),
        storage: StorageConfig {
            posts_store_dir: store_dir.clone(),
            max_upload_size: 10 * 1024 * 1024, // 10MB for tests
        },
    };

    let store = SqlitePostStore::open(&db_path)
        .await
        .expect("Failed to open test database");
    store.migrate().await.expect("Failed to migrate test database");

    let content = ContentTree::new(&store_dir).expect("Failed to create test store root");
    let oidc = OidcClient::new(config.oidc.clone()).expect("Failed to build OIDC client");
    let profiles = ProfileChecker::new(&config.instagram).expect("Failed to build profile checker");

    Arc::new(AppState {
        config,
        content,
        oidc,
        profiles,
        store: Arc::new(store),
    })
}

const BOUNDARY: &str = "cmuinsta-test-boundary";

/// Builds `multipart/form-data` request bodies.
#[derive(Default)]
pub struct MultipartBuilder {
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, uri: &str) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.body))
            .expect("Failed to build multipart request")
    }
}
