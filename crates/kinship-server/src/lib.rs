//! Kinship Server
//!
//! HTTP surface for the relationship engine: JWT bearer sessions, the
//! `/friend` routes, and a health check. Configuration comes from TOML.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod session;

use config::{ServerConfig, UserSeed};
use handlers::{create_router, AppState};
use kinship_domain::traits::UserDirectory;
use kinship_engine::RelationshipEngine;
use kinship_store::{SqliteStore, StoreError};
use session::SessionManager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Store could not be opened or seeded
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),

    /// Bad command-line arguments
    #[error("{0}")]
    Usage(String),
}

/// Insert configured users that the directory does not know yet
///
/// A seed is skipped when its identity or its contact address already
/// exists. Returns the number of users inserted.
pub fn seed_users(store: &mut SqliteStore, seeds: &[UserSeed]) -> Result<usize, ServerError> {
    let mut inserted = 0;
    for seed in seeds {
        let user = seed.to_user()?;
        let known = store.find_by_identity(user.id)?.is_some()
            || store.find_by_contact(&user.contact)?.is_some();
        if known {
            debug!("user {} already present, skipping", user.contact);
            continue;
        }
        store.insert_user(&user)?;
        inserted += 1;
    }
    Ok(inserted)
}

/// Open the store, seed it, and assemble the application state
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let mut store = SqliteStore::open(&config.database_path, config.busy_timeout())?;
    let seeded = seed_users(&mut store, &config.users)?;
    info!("Seeded {} user(s)", seeded);

    let session_manager = Arc::new(SessionManager::new(
        &config.jwt_secret,
        config.token_expiry_secs,
    ));

    Ok(AppState {
        engine: Arc::new(RelationshipEngine::new(store)),
        session_manager,
    })
}

/// Start the HTTP server
///
/// Installs the tracing subscriber, opens the store, and serves the axum
/// router until the process exits.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Kinship server");
    info!("Bind address: {}", config.bind_addr());
    info!("Database: {}", config.database_path);
    info!("Token expiry: {} seconds", config.token_expiry_secs);

    let state = build_state(&config)?;
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}
