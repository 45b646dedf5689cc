// src/api/mod.rs — HTTP surface: router, shared state, server startup

pub mod handlers;
pub mod types;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::infra::config::Config;
use crate::provider::ChatProvider;
use crate::session::SessionRegistry;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionRegistry>,
    pub provider: Arc<dyn ChatProvider>,
}

/// Build the axum router with both API routes.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/api/upload", post(handlers::upload_log))
        .route("/api/chat", post(handlers::chat))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until interrupted.
pub async fn start_server(state: ApiState) -> anyhow::Result<()> {
    let addr = state.config.server.bind.clone();
    let router = build_router(state);

    tracing::info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
