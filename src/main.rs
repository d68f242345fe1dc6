use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cmuinsta::{
    api,
    auth::OidcClient,
    config::{mask_secret, Config},
    content::ContentTree,
    instagram::ProfileChecker,
    storage, AppState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "gcp" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_stackdriver::layer())
                .init();
        }
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "cmuinsta-backend starting");

    // Load configuration
    let config = Config::load()?;
    info!(
        bind_address = %config.server.bind_address,
        database = ?config.database.backend,
        posts_store_dir = %config.storage.posts_store_dir.display(),
        max_upload_size = config.storage.max_upload_size,
        oidc_issuer = %config.oidc.issuer_url,
        oidc_client_id = %config.oidc.client_id,
        oidc_client_secret = %mask_secret(&config.oidc.client_secret),
        admins = config.admins.len(),
        cors_origin = %config.server.cors_allowed_origin,
        "Loaded configuration"
    );

    // Open the metadata store and bring the schema up to date
    let store = storage::connect(&config.database).await?;
    store.migrate().await?;
    info!("Database schema is up to date");

    // Store root for submission directories
    let content = ContentTree::new(&config.storage.posts_store_dir)?;
    info!("Post store root: {}", content.root().display());

    let oidc = OidcClient::new(config.oidc.clone())?;
    let profiles = ProfileChecker::new(&config.instagram)?;

    // Create shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        content,
        oidc,
        profiles,
        store: Arc::clone(&store),
    });

    // Build and start the HTTP server
    let app = api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    info!("Listening on: {}", config.server.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Closing database pool");
    store.close().await;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
