//! Instagram username existence check.

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{redirect, Client, StatusCode};
use thiserror::Error;

use crate::config::InstagramConfig;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum ProfileCheckError {
    #[error("Instagram unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rate limited by Instagram")]
    RateLimited,
    #[error("unexpected status code: {0}")]
    UnexpectedStatus(StatusCode),
}

/// Instagram handles: letters, digits, `.` and `_`, 1 to 30 characters.
pub fn is_valid_username(username: &str) -> bool {
    (1..=30).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}

pub struct ProfileChecker {
    base_url: String,
    client: Client,
}

impl ProfileChecker {
    pub fn new(config: &InstagramConfig) -> Result<Self, ProfileCheckError> {
        let client = Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    /// Ask the profile page whether `username` exists.
    ///
    /// A redirect usually means a private or login-walled profile, which
    /// still exists. Anything the page can't answer definitively is an error
    /// so the caller can decide how to degrade.
    pub async fn profile_exists(&self, username: &str) -> Result<bool, ProfileCheckError> {
        let resp = self
            .client
            .get(format!("{}/{username}/", self.base_url))
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK | StatusCode::FOUND | StatusCode::MOVED_PERMANENTLY => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            StatusCode::TOO_MANY_REQUESTS => Err(ProfileCheckError::RateLimited),
            other => Err(ProfileCheckError::UnexpectedStatus(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_format() {
        assert!(is_valid_username("alice"));
        assert!(is_valid_username("a.b_c.123"));
        assert!(is_valid_username(&"x".repeat(30)));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username(&"x".repeat(31)));
        assert!(!is_valid_username("@alice"));
        assert!(!is_valid_username("bad name"));
        assert!(!is_valid_username("émilie"));
    }
}
