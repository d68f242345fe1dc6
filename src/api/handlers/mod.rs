mod admin;
mod auth;
mod instagram;
mod posts;

use crate::api::response::ApiError;
use crate::auth::AuthError;

pub use admin::{dashboard, health, prefrosh_list, verify_list};
pub use auth::{auth_callback, check_admin, login_url, logout_url, me};
pub use instagram::validate_username;
pub use posts::{get_post, get_post_file, list_posts, submit_post};

/// Messages shown for each way an identity provider call can fail.
struct AuthFailureMessages {
    transport: &'static str,
    rejected: &'static str,
    decode: &'static str,
}

/// Map an AuthError to an ApiError
fn auth_error(e: AuthError, messages: AuthFailureMessages) -> ApiError {
    match e {
        AuthError::Transport(source) => {
            tracing::warn!(error = %source, "Identity provider unreachable");
            ApiError::internal(messages.transport)
        }
        AuthError::Rejected { status, body } => {
            tracing::warn!(status = status.as_u16(), body = %body, "Identity provider rejected request");
            ApiError::unauthorized(messages.rejected)
        }
        AuthError::Decode(source) => {
            tracing::warn!(error = %source, "Unexpected identity provider response");
            ApiError::internal(messages.decode)
        }
        AuthError::InvalidUrl(source) => ApiError::internal(format!("Invalid OIDC URL: {source}")),
    }
}
