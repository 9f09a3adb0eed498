//! # HTTP server
//!
//! - `GET|POST /fund` - report as JSON (`Funds`, `Avg`)
//! - `GET /fund.html` - report as an HTML table
//!
//! When the fund list is empty, instruments are read from the request body
//! as `[{"Id": "...", "Weight": 1.0}]`.

pub mod error;
pub mod handlers;
pub mod html;

pub use error::{ApiError, ApiResult};
pub use handlers::AppState;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/fund",
            get(handlers::fund_json).post(handlers::fund_json),
        )
        .route("/fund.html", get(handlers::fund_html))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the fund routes on all interfaces until Ctrl-C.
pub async fn serve(state: Arc<AppState>, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
