//! # amor-server
//!
//! HTTP server holding the couple page's preferences document.
//!
//! This binary provides:
//! - **`GET /api/preferences`**: the full document, never an error status
//!   (falls back to defaults when storage misbehaves)
//! - **`POST /api/preferences`**: merge-write of a partial document
//! - **`GET /health`** for liveness checks
//!
//! The document is a single JSON file on disk. There is one document per
//! server; no authentication is enforced on the preferences routes.

mod api;
mod config;
mod error;
mod service;

use std::sync::Arc;

use amor_store::JsonFileStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::service::PreferencesService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,amor_server=debug,amor_store=debug")),
        )
        .init();

    info!("Starting preferences server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Wire the store and the service
    // -----------------------------------------------------------------------
    // The file is created lazily by the first read.
    let store = Arc::new(JsonFileStore::new(config.preferences_path.clone()));
    info!(path = %store.path().display(), "Preferences store configured");

    let app_state = AppState {
        service: PreferencesService::new(store),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
