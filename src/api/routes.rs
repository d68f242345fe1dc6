use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.storage.max_upload_size as usize;
    let cors = cors_layer(&state.config.server.cors_allowed_origin);

    Router::new()
        // Auth
        .route("/api/auth/login-url", get(handlers::login_url))
        .route("/api/auth/logout-url", get(handlers::logout_url))
        .route("/api/auth/callback", post(handlers::auth_callback))
        .route("/api/auth/me", get(handlers::me))
        .route("/api/auth/check-admin", post(handlers::check_admin))
        // Posts
        .route(
            "/api/posts/submit",
            post(handlers::submit_post).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/posts/list", get(handlers::list_posts))
        .route("/api/posts/:id", get(handlers::get_post))
        .route("/api/posts/:id/files/:name", get(handlers::get_post_file))
        // Instagram
        .route("/api/instagram/validate", get(handlers::validate_username))
        // Stubs
        .route("/api/admin/dashboard", get(handlers::dashboard))
        .route("/api/prefrosh/list", get(handlers::prefrosh_list))
        .route("/api/verify/list", get(handlers::verify_list))
        .route("/api/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let origin = if allowed_origin == "*" {
        AllowOrigin::any()
    } else {
        match HeaderValue::from_str(allowed_origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                tracing::warn!(origin = %allowed_origin, error = %e, "Invalid CORS origin, allowing any");
                AllowOrigin::any()
            }
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::testutil::test_state;

    use super::*;

    #[tokio::test]
    async fn test_preflight_is_answered() {
        let temp = tempfile::tempdir().unwrap();
        let state = test_state(&temp).await;

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/posts/submit")
            .header(header::ORIGIN, "https://insta.example.edu")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = create_router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_stub_endpoints() {
        let temp = tempfile::tempdir().unwrap();
        let state = test_state(&temp).await;

        let response = create_router(state.clone())
            .oneshot(
                Request::get("/api/admin/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"Welcome to the Admin Dashboard");

        let response = create_router(state)
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
