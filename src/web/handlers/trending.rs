// Trending handler: samples the cached pool as ghost posts.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::AppError;
use crate::rate_limit::presets;
use crate::trends::MAX_SAMPLE;
use crate::web::{client_ip, AppState};

const DEFAULT_COUNT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct TrendingParams {
    pub count: Option<usize>,
    /// Bypass the cached pool and refetch.
    pub force: Option<bool>,
}

/// GET /api/trending
pub async fn get_trending(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<TrendingParams>,
) -> Result<impl IntoResponse, AppError> {
    state
        .limiter
        .enforce(&client_ip(&headers), presets::TRENDING)
        .await?;

    let count = params.count.unwrap_or(DEFAULT_COUNT).clamp(1, MAX_SAMPLE);
    let response = state
        .trends
        .sample(count, params.force.unwrap_or(false))
        .await;
    Ok(Json(response))
}
