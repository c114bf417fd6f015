//! API layer - HTTP handlers and routing
//!
//! A single placeholder route:
//! - `GET /` - greeting, after looking up user 1

pub mod hello;
pub mod middleware;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::db::Store;

pub use middleware::{ApiError, AppState};

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(hello::hello))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind to the configured address and serve until the process is stopped
pub async fn serve(store: Store, config: &ServerConfig) -> Result<()> {
    let app = build_router(AppState::new(store));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
