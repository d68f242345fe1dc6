//! OIDC token exchange against a Keycloak-style identity provider.
//!
//! The provider is treated as opaque: the backend only builds the
//! authorization/logout URLs, exchanges an authorization code for tokens,
//! and resolves an access token to a user via the userinfo endpoint.

mod admin;

pub use admin::{normalize_identity, AdminList};

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::OidcConfig;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid OIDC URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Identity provider unreachable: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Identity provider rejected the request ({status}): {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("Unexpected identity provider response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Userinfo endpoint response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    /// The Andrew ID
    #[serde(default)]
    pub preferred_username: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub name: String,
}

/// The user as presented to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub andrew_id: String,
    pub email: String,
    pub name: String,
    pub given_name: String,
}

impl From<&UserInfo> for SessionUser {
    fn from(info: &UserInfo) -> Self {
        Self {
            andrew_id: normalize_identity(&info.preferred_username),
            email: info.email.clone(),
            name: info.name.clone(),
            given_name: info.given_name.clone(),
        }
    }
}

pub struct OidcClient {
    client: Client,
    config: OidcConfig,
}

impl OidcClient {
    pub fn new(config: OidcConfig) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .map_err(AuthError::Transport)?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/protocol/openid-connect/{name}", self.config.issuer_url)
    }

    /// Authorization URL the browser is sent to.
    pub fn login_url(&self) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &self.endpoint("auth"),
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("scope", "openid profile email"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ],
        )?;
        Ok(url.into())
    }

    /// End-session URL; the user lands back on the app root afterwards.
    pub fn logout_url(&self) -> Result<String, AuthError> {
        let home = self
            .config
            .redirect_uri
            .strip_suffix("/callback")
            .unwrap_or(&self.config.redirect_uri);
        let url = Url::parse_with_params(
            &self.endpoint("logout"),
            &[
                ("client_id", self.config.client_id.as_str()),
                ("post_logout_redirect_uri", home),
            ],
        )?;
        Ok(url.into())
    }

    /// Exchange an authorization code for tokens. `redirect_uri` overrides the configured one.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> Result<TokenResponse, AuthError> {
        let redirect_uri = redirect_uri
            .filter(|r| !r.is_empty())
            .unwrap_or(&self.config.redirect_uri);

        let resp = self
            .client
            .post(self.endpoint("token"))
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let resp = ensure_ok(resp).await?;
        resp.json().await.map_err(AuthError::Decode)
    }

    /// Resolve an access token to its user. Doubles as token validation.
    pub async fn user_info(&self, access_token: &str) -> Result<UserInfo, AuthError> {
        let resp = self
            .client
            .get(self.endpoint("userinfo"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let resp = ensure_ok(resp).await?;
        resp.json().await.map_err(AuthError::Decode)
    }
}

async fn ensure_ok(resp: reqwest::Response) -> Result<reqwest::Response, AuthError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(AuthError::Rejected { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OidcClient {
        OidcClient::new(OidcConfig {
            issuer_url: "https://login.example.edu/realms/cmu".to_string(),
            client_id: "cmuinsta".to_string(),
            client_secret: "s3cret".to_string(),
            redirect_uri: "https://insta.example.edu/callback".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_login_url() {
        let url = Url::parse(&client().login_url().unwrap()).unwrap();
        assert_eq!(
            url.path(),
            "/realms/cmu/protocol/openid-connect/auth"
        );
        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(params.contains(&("client_id".into(), "cmuinsta".into())));
        assert!(params.contains(&("response_type".into(), "code".into())));
        assert!(params.contains(&("scope".into(), "openid profile email".into())));
        assert!(params.contains(&(
            "redirect_uri".into(),
            "https://insta.example.edu/callback".into()
        )));
    }

    #[test]
    fn test_logout_url_strips_callback() {
        let url = Url::parse(&client().logout_url().unwrap()).unwrap();
        assert_eq!(
            url.path(),
            "/realms/cmu/protocol/openid-connect/logout"
        );
        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(params.contains(&(
            "post_logout_redirect_uri".into(),
            "https://insta.example.edu".into()
        )));
    }

    #[test]
    fn test_session_user_normalizes_identity() {
        let info = UserInfo {
            preferred_username: " ABC123 ".to_string(),
            name: "A B".to_string(),
            ..Default::default()
        };
        let user = SessionUser::from(&info);
        assert_eq!(user.andrew_id, "abc123");
        assert_eq!(user.name, "A B");
    }
}
