//! cmuinsta - backend for collecting Instagram feature submissions
//!
//! This crate provides:
//! - OIDC login against the campus identity provider, with a configured admin list
//! - Multipart post submission, stored as a directory of caption, handle and media
//!   files plus one metadata row in a relational store (PostgreSQL or SQLite)
//! - Read endpoints that join the row with what is on disk
//! - An Instagram username existence check

pub mod api;
pub mod auth;
pub mod config;
pub mod content;
pub mod instagram;
pub mod state_machine;
pub mod storage;
pub mod submission;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use auth::OidcClient;
use config::Config;
use content::ContentTree;
use instagram::ProfileChecker;
use storage::PostStore;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub content: ContentTree,
    pub oidc: OidcClient,
    pub profiles: ProfileChecker,
    pub store: Arc<dyn PostStore>,
}
