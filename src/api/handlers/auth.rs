use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{auth_error, AuthFailureMessages};
use crate::api::response::{ApiError, AppJson, Envelope};
use crate::auth::{normalize_identity, SessionUser};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUrlResponse {
    pub login_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutUrlResponse {
    pub logout_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub user: SessionUser,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: SessionUser,
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAdminRequest {
    #[serde(default)]
    pub andrew_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAdminResponse {
    pub is_admin: bool,
    pub andrew_id: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn login_url(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<LoginUrlResponse>>, ApiError> {
    let login_url = state
        .oidc
        .login_url()
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Envelope::success(LoginUrlResponse { login_url }))
}

pub async fn logout_url(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<LogoutUrlResponse>>, ApiError> {
    let logout_url = state
        .oidc
        .logout_url()
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Envelope::success(LogoutUrlResponse { logout_url }))
}

/// Finish the authorization code flow.
/// Route: POST /api/auth/callback
pub async fn auth_callback(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CallbackRequest>,
) -> Result<Json<Envelope<CallbackResponse>>, ApiError> {
    if req.code.trim().is_empty() {
        return Err(ApiError::bad_request("Authorization code is required"));
    }

    let tokens = state
        .oidc
        .exchange_code(&req.code, req.redirect_uri.as_deref())
        .await
        .map_err(|e| {
            auth_error(
                e,
                AuthFailureMessages {
                    transport: "Failed to exchange code for tokens",
                    rejected: "Token exchange failed",
                    decode: "Failed to parse token response",
                },
            )
        })?;

    let info = state
        .oidc
        .user_info(&tokens.access_token)
        .await
        .map_err(|e| {
            auth_error(
                e,
                AuthFailureMessages {
                    transport: "Failed to fetch user info",
                    rejected: "Invalid or expired token",
                    decode: "Failed to parse user info",
                },
            )
        })?;

    let user = SessionUser::from(&info);
    let is_admin = state.config.admins.is_admin(&user.andrew_id);
    tracing::info!(andrew_id = %user.andrew_id, is_admin, "User logged in");

    Ok(Envelope::success(CallbackResponse {
        access_token: tokens.access_token,
        expires_in: tokens.expires_in,
        user,
        is_admin,
    }))
}

/// Resolve the bearer token to the current user.
/// Route: GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Envelope<MeResponse>>, ApiError> {
    let token = bearer_token(&headers).ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    let info = state.oidc.user_info(token).await.map_err(|e| {
        auth_error(
            e,
            AuthFailureMessages {
                transport: "Failed to validate token",
                rejected: "Invalid or expired token",
                decode: "Failed to parse user info",
            },
        )
    })?;

    let user = SessionUser::from(&info);
    let is_admin = state.config.admins.is_admin(&user.andrew_id);

    Ok(Envelope::success(MeResponse { user, is_admin }))
}

pub async fn check_admin(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CheckAdminRequest>,
) -> Result<Json<Envelope<CheckAdminResponse>>, ApiError> {
    let andrew_id = normalize_identity(&req.andrew_id);
    if andrew_id.is_empty() {
        return Err(ApiError::bad_request("andrewId is required"));
    }

    Ok(Envelope::success(CheckAdminResponse {
        is_admin: state.config.admins.is_admin(&andrew_id),
        andrew_id,
    }))
}

// ============================================================================
// Helpers
// ============================================================================

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
