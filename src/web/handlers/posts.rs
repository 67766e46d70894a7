// Post handlers: submit, feed, detail, react.

use std::str::FromStr;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::db::models::{FeedFilter, Location, Reaction, Scope};
use crate::error::AppError;
use crate::input::{self, sanitize_location};
use crate::pipeline::feed::DEFAULT_PAGE_SIZE;
use crate::pipeline::FeedRequest;
use crate::rate_limit::presets;
use crate::web::{client_ip, AppState};

/// POST /api/posts: run a submission through the whole write pipeline.
///
/// The body is taken raw so the size ceiling is checked before any parsing.
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    state
        .limiter
        .enforce(&client_ip(&headers), presets::CREATE_POST)
        .await?;

    let submission = input::validate_body(&body, state.config.max_payload_bytes)?;
    let result = state.submissions.submit(submission).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedParams {
    pub filter: Option<String>,
    pub scope: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub location_city: Option<String>,
    pub location_state: Option<String>,
    pub location_country: Option<String>,
    /// Set to false to suppress ghost backfill.
    pub ghosts: Option<bool>,
}

impl FeedParams {
    fn into_request(self) -> Result<FeedRequest, AppError> {
        let filter = self
            .filter
            .as_deref()
            .map(FeedFilter::from_str)
            .transpose()
            .map_err(AppError::ValidationError)?
            .unwrap_or_default();
        let scope = self
            .scope
            .as_deref()
            .map(Scope::from_str)
            .transpose()
            .map_err(AppError::ValidationError)?;

        Ok(FeedRequest {
            filter,
            scope,
            location: Location {
                city: sanitize_location(self.location_city.as_deref()),
                state: sanitize_location(self.location_state.as_deref()),
                country: sanitize_location(self.location_country.as_deref()),
            },
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            offset: self.offset.unwrap_or(0),
            ghosts: self.ghosts.unwrap_or(true),
        })
    }
}

/// GET /api/posts: paginated feed.
pub async fn list_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<FeedParams>,
) -> Result<impl IntoResponse, AppError> {
    state
        .limiter
        .enforce(&client_ip(&headers), presets::READ_FEED)
        .await?;

    let page = state.feed.list(params.into_request()?).await?;
    Ok(Json(page))
}

/// GET /api/posts/{id}: one post with live uniqueness.
pub async fn get_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state
        .limiter
        .enforce(&client_ip(&headers), presets::READ_FEED)
        .await?;

    Ok(Json(state.feed.detail(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ReactBody {
    pub reaction: Reaction,
}

/// POST /api/posts/{id}/react
pub async fn react(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<ReactBody>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    state
        .limiter
        .enforce(&client_ip(&headers), presets::REACT)
        .await?;

    let Json(body) = body.map_err(|_| {
        AppError::BadRequest("Expected {\"reaction\": \"funny\" | \"creative\" | \"must_try\"}".into())
    })?;
    let post = state.feed.react(&id, body.reaction).await?;
    Ok(Json(serde_json::json!({
        "id": post.id,
        "funnyCount": post.funny_count,
        "creativeCount": post.creative_count,
        "mustTryCount": post.must_try_count,
        "totalReactions": post.total_reactions,
    })))
}
