//! Site-level handlers

use super::ok_data;
use crate::{ApiError, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// GET /storage - List sites
pub async fn list_sites(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let sites = state.service.list_sites().await?;
    Ok(ok_data(sites))
}

/// GET /storage/{site} - List the buckets of a site
pub async fn site_contents(
    State(state): State<Arc<AppState>>,
    Path(site): Path<String>,
) -> Result<Response, ApiError> {
    let contents = state.service.site_contents(&site).await?;
    Ok(ok_data(contents))
}

/// GET /health - Health check
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
