use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{
        header::{CACHE_CONTROL, EXPIRES, PRAGMA},
        Method,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use amor_shared::constants::{NO_STORE_CACHE_CONTROL, PREFERENCES_ROUTE};
use amor_shared::protocol::{HealthResponse, SaveResponse};
use amor_shared::PartialPreferences;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::service::PreferencesService;

#[derive(Clone)]
pub struct AppState {
    pub service: PreferencesService,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route(
            PREFERENCES_ROUTE,
            get(get_preferences).post(save_preferences),
        )
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Always 200: internal failures are answered with the defaults.
async fn get_preferences(State(state): State<AppState>) -> impl IntoResponse {
    let preferences = state.service.read();

    (
        [
            (CACHE_CONTROL, NO_STORE_CACHE_CONTROL),
            (PRAGMA, "no-cache"),
            (EXPIRES, "0"),
        ],
        Json(preferences),
    )
}

async fn save_preferences(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SaveResponse>, ServerError> {
    let partial = PartialPreferences::from_json_slice(&body?)?;
    let preferences = state.service.merge_write(&partial)?;
    Ok(Json(SaveResponse::saved(preferences)))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
