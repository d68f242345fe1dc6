use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppQuery, Envelope};
use crate::instagram::is_valid_username;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ValidateParams {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub username: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Check whether an Instagram handle exists.
/// Route: GET /api/instagram/validate?username=...
///
/// When Instagram can't give a definitive answer the handle is assumed to
/// exist so that submissions aren't blocked on an upstream outage.
pub async fn validate_username(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ValidateParams>,
) -> Result<Json<Envelope<ValidateResponse>>, ApiError> {
    let username = params.username.unwrap_or_default().trim().to_string();
    if username.is_empty() {
        return Err(ApiError::bad_request("Username is required"));
    }
    if !is_valid_username(&username) {
        return Err(ApiError::bad_request("Invalid username format"));
    }

    let response = match state.profiles.profile_exists(&username).await {
        Ok(exists) => ValidateResponse {
            username,
            exists,
            message: None,
        },
        Err(e) => {
            tracing::warn!(username = %username, error = %e, "Instagram check inconclusive");
            ValidateResponse {
                username,
                exists: true,
                message: Some("Could not verify, assuming valid".to_string()),
            }
        }
    };

    Ok(Envelope::success(response))
}
