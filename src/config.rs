use std::path::PathBuf;

use thiserror::Error;

use crate::auth::AdminList;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub admins: AdminList,
    pub database: DatabaseConfig,
    pub instagram: InstagramConfig,
    pub oidc: OidcConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Value for `Access-Control-Allow-Origin`; `*` allows any origin.
    pub cors_allowed_origin: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Postgres,
    Sqlite,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Store root: every submission lands in `{posts_store_dir}/{andrewId}/{unixSeconds}`.
    pub posts_store_dir: PathBuf,
    /// Maximum multipart body size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone, Default)]
pub struct OidcConfig {
    pub issuer_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone)]
pub struct InstagramConfig {
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            cors_allowed_origin: "*".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            posts_store_dir: PathBuf::from("../.posts_store"),
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.instagram.com".to_string(),
        }
    }
}

impl DatabaseBackend {
    /// Pick the backend from the connection URL scheme.
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next().unwrap_or("").to_lowercase();
        match scheme.as_str() {
            "postgres" | "postgresql" => Some(DatabaseBackend::Postgres),
            "sqlite" => Some(DatabaseBackend::Sqlite),
            _ => None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_address = var("BIND_ADDRESS").unwrap_or_else(|| {
            let port = var("PORT").unwrap_or_else(|| "8080".to_string());
            format!("0.0.0.0:{port}")
        });

        let cors_allowed_origin = var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|| "*".to_string());

        let database_url = var("DATABASE_URL").ok_or_else(|| {
            ConfigError::ValidationError("DATABASE_URL environment variable is not set".to_string())
        })?;

        let backend = DatabaseBackend::from_url(&database_url).ok_or_else(|| {
            ConfigError::ValidationError(
                "DATABASE_URL must start with postgres:// or sqlite:".to_string(),
            )
        })?;

        let max_connections = var("DATABASE_MAX_CONNECTIONS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let posts_store_dir = var("POSTS_STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| StorageConfig::default().posts_store_dir);

        let max_upload_size = var("MAX_UPLOAD_SIZE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(StorageConfig::default().max_upload_size);

        let oidc = OidcConfig {
            issuer_url: var("OIDC_ISSUER_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_default(),
            client_id: var("OIDC_CLIENT_ID").unwrap_or_default(),
            client_secret: var("OIDC_CLIENT_SECRET").unwrap_or_default(),
            redirect_uri: var("OIDC_REDIRECT_URI").unwrap_or_default(),
        };

        let admins = var("ADMIN_IDS")
            .map(|ids| AdminList::parse(&ids))
            .unwrap_or_default();

        let instagram = InstagramConfig {
            base_url: var("INSTAGRAM_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|| InstagramConfig::default().base_url),
        };

        let config = Config {
            admins,
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            instagram,
            oidc,
            server: ServerConfig {
                bind_address,
                cors_allowed_origin,
            },
            storage: StorageConfig {
                posts_store_dir,
                max_upload_size,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "DATABASE_MAX_CONNECTIONS must be greater than 0".to_string(),
            ));
        }

        if self.oidc.issuer_url.is_empty() || self.oidc.client_id.is_empty() {
            tracing::warn!("OIDC_ISSUER_URL or OIDC_CLIENT_ID is not set; login will not work");
        }

        Ok(())
    }
}

/// Hide most of a secret for log output.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    match chars.len() {
        0 => "(not set)".to_string(),
        1..=4 => "****".to_string(),
        n => format!(
            "{}****{}",
            chars[..2].iter().collect::<String>(),
            chars[n - 2..].iter().collect::<String>()
        ),
    }
}
