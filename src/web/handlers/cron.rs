// Scheduler hook: refreshes the trending pool ahead of expiry.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use tracing::{info, warn};

use crate::error::AppError;
use crate::web::AppState;

pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// POST /api/cron/refresh-trending
///
/// Requires `x-cron-secret` to match RARELY_CRON_SECRET. An unset secret
/// disables the endpoint entirely.
pub async fn refresh_trending(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let provided = headers
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !secret_matches(&state.config.cron_secret, provided) {
        warn!("Rejected trending refresh with a bad or missing secret");
        return Err(AppError::Unauthorized);
    }

    let refreshed = state.trends.refresh().await;
    info!(
        pool_size = refreshed.pool.items.len(),
        stale = refreshed.stale,
        "Trending pool refreshed by scheduler"
    );
    Ok(Json(serde_json::json!({
        "refreshed": !refreshed.stale && !refreshed.pool.items.is_empty(),
        "poolSize": refreshed.pool.items.len(),
        "stale": refreshed.stale,
    })))
}

/// Constant-time comparison so response timing can't leak the secret.
fn secret_matches(expected: &str, provided: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    expected.len() == provided.len()
        && expected
            .bytes()
            .zip(provided.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}
