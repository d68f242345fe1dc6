use axum::extract::Path;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use cmuinsta::config::InstagramConfig;
use cmuinsta::instagram::{ProfileCheckError, ProfileChecker};

/// Fake profile pages keyed by username.
async fn spawn_profiles() -> String {
    async fn profile(Path(username): Path<String>, headers: HeaderMap) -> impl IntoResponse {
        if !headers.contains_key(header::USER_AGENT) {
            return StatusCode::BAD_REQUEST.into_response();
        }
        match username.as_str() {
            "alice" => StatusCode::OK.into_response(),
            "private.bob" => (
                StatusCode::FOUND,
                [(header::LOCATION, "/accounts/login/")],
            )
                .into_response(),
            "busy" => StatusCode::TOO_MANY_REQUESTS.into_response(),
            "broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    let app = Router::new().route("/:username/", get(profile));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

async fn checker() -> ProfileChecker {
    let base_url = spawn_profiles().await;
    ProfileChecker::new(&InstagramConfig { base_url }).unwrap()
}

#[tokio::test]
async fn test_existing_profile() {
    let checker = checker().await;
    assert!(checker.profile_exists("alice").await.unwrap());
}

#[tokio::test]
async fn test_redirect_counts_as_existing() {
    let checker = checker().await;
    assert!(checker.profile_exists("private.bob").await.unwrap());
}

#[tokio::test]
async fn test_missing_profile() {
    let checker = checker().await;
    assert!(!checker.profile_exists("nobody_here").await.unwrap());
}

#[tokio::test]
async fn test_inconclusive_answers() {
    let checker = checker().await;

    assert!(matches!(
        checker.profile_exists("busy").await,
        Err(ProfileCheckError::RateLimited)
    ));
    assert!(matches!(
        checker.profile_exists("broken").await,
        Err(ProfileCheckError::UnexpectedStatus(status)) if status == StatusCode::INTERNAL_SERVER_ERROR
    ));
}

#[tokio::test]
async fn test_unreachable_host() {
    let checker = ProfileChecker::new(&InstagramConfig {
        base_url: "http://127.0.0.1:9".to_string(),
    })
    .unwrap();

    assert!(matches!(
        checker.profile_exists("alice").await,
        Err(ProfileCheckError::Transport(_))
    ));
}
