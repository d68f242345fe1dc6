use axum::Json;
use serde::Serialize;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct StubListResponse {
    pub message: String,
    pub time: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "backend is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn dashboard() -> &'static str {
    "Welcome to the Admin Dashboard"
}

// Placeholders until the prefrosh and verification queues exist

pub async fn prefrosh_list() -> Json<StubListResponse> {
    Json(StubListResponse {
        message: "Hello from the prefrosh service".to_string(),
        time: "Now".to_string(),
    })
}

pub async fn verify_list() -> Json<StubListResponse> {
    Json(StubListResponse {
        message: "Hello from the verification service".to_string(),
        time: "Now".to_string(),
    })
}
