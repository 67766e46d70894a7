// Operational counters: moderation outcomes and today's world leaderboard.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use crate::db::models::{Location, Scope};
use crate::error::AppError;
use crate::pipeline::leaderboard;
use crate::web::AppState;

const LEADERBOARD_SIZE: usize = 10;

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let moderation = state.moderation.stats().await;
    let top = leaderboard::top(
        &state.cache,
        Scope::World,
        &Location::default(),
        LEADERBOARD_SIZE,
        Utc::now(),
    )
    .await;

    Ok(Json(serde_json::json!({
        "moderation": moderation,
        "classifier": state.moderation.has_classifier(),
        "cacheAvailable": state.cache.is_available(),
        "leaderboard": top,
    })))
}
