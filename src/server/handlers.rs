//! Request handlers.

use super::error::{ApiError, ApiResult};
use super::html;
use crate::core::{FanOutCoordinator, InstrumentRequest, Report, fund_list};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    response::{Html, IntoResponse, Response},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared state for the fund routes.
pub struct AppState {
    pub coordinator: FanOutCoordinator,
    /// Fund list consulted on every request.
    pub fund_list: PathBuf,
}

/// `GET|POST /fund`
pub async fn fund_json(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<Report>> {
    Ok(Json(build_report(&state, &body).await?))
}

/// `GET /fund.html`
pub async fn fund_html(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match build_report(&state, &body).await {
        Ok(report) => Html(html::render_report(&report)).into_response(),
        Err(e) => {
            let status = e.status();
            warn!(status = %status, error = %e, "Fund page request failed");
            (status, Html(html::render_error(status, &e.to_string()))).into_response()
        }
    }
}

async fn build_report(state: &AppState, body: &[u8]) -> ApiResult<Report> {
    let mut requests = fund_list::load_requests(&state.fund_list)
        .map_err(|e| ApiError::Internal(format!("{e:#}")))?;
    if requests.is_empty() {
        debug!("Fund list is empty, reading instruments from request body");
        requests = requests_from_body(body)?;
    }

    info!(instruments = requests.len(), "Building fund report");
    Ok(state.coordinator.run(&requests).await?)
}

fn requests_from_body(body: &[u8]) -> ApiResult<Vec<InstrumentRequest>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid instrument list: {e}")))
}
