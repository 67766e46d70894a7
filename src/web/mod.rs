// Web server: Axum JSON API.
//
// Every /api route is rate limited per client (first X-Forwarded-For
// entry, then X-Real-IP, then "anonymous"). Handlers return
// Result<_, AppError>; the IntoResponse impl below is the only place an
// error becomes a status code and body. Internal errors are logged here and
// rendered as a generic message.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::cache::Cache;
use crate::config::Config;
use crate::db::PostStore;
use crate::error::AppError;
use crate::moderation::ModerationOrchestrator;
use crate::pipeline::{FeedService, SubmissionService};
use crate::rate_limit::RateLimiter;
use crate::toxicity::traits::ToxicityScorer;
use crate::trends::TrendAggregator;

pub mod handlers;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Cache,
    pub limiter: RateLimiter,
    pub moderation: ModerationOrchestrator,
    pub submissions: SubmissionService,
    pub feed: FeedService,
    pub trends: TrendAggregator,
}

impl AppState {
    /// Wire every service from its dependencies.
    pub fn new(
        config: Config,
        store: Arc<dyn PostStore>,
        cache: Cache,
        classifier: Option<Arc<dyn ToxicityScorer>>,
        trends: TrendAggregator,
    ) -> Self {
        let moderation =
            ModerationOrchestrator::new(classifier, cache.clone(), config.classifier_timeout);
        Self {
            limiter: RateLimiter::new(cache.clone()),
            submissions: SubmissionService::new(store.clone(), moderation.clone(), cache.clone()),
            feed: FeedService::new(store, Some(trends.clone()), cache.clone()),
            moderation,
            trends,
            cache,
            config: Arc::new(config),
        }
    }
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(state: AppState, port: u16, bind: &str) -> Result<()> {
    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("rarely API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/api/posts",
            post(handlers::posts::create_post).get(handlers::posts::list_posts),
        )
        .route("/api/posts/{id}", get(handlers::posts::get_post))
        .route("/api/posts/{id}/react", post(handlers::posts::react))
        .route("/api/trending", get(handlers::trending::get_trending))
        .route(
            "/api/cron/refresh-trending",
            post(handlers::cron::refresh_trending),
        )
        .route("/api/stats", get(handlers::stats::get_stats));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check: always returns 200 OK.
async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Who to count a request against.
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    forwarded
        .or_else(real_ip)
        .unwrap_or("anonymous")
        .to_string()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match self {
            AppError::ValidationError(message) | AppError::BadRequest(message) => {
                api_error(status, &message)
            }
            AppError::RateLimitExceeded {
                limit,
                remaining,
                reset_seconds,
            } => {
                let body = Json(serde_json::json!({
                    "error": "Too many requests. Please slow down.",
                    "limit": limit,
                    "remaining": remaining,
                    "resetSeconds": reset_seconds,
                }));
                let retry_after = HeaderValue::from(reset_seconds.max(1));
                (status, [(header::RETRY_AFTER, retry_after)], body).into_response()
            }
            AppError::PayloadTooLarge { max, .. } => (
                status,
                Json(serde_json::json!({
                    "error": "Payload too large",
                    "maxBytes": max,
                })),
            )
                .into_response(),
            AppError::QualityRejected {
                reason,
                quality_score,
                suggestion,
            } => (
                status,
                Json(serde_json::json!({
                    "error": "Content didn't pass the quality check",
                    "reason": reason,
                    "qualityScore": quality_score,
                    "suggestion": suggestion,
                })),
            )
                .into_response(),
            AppError::ModerationBlocked {
                blocked_by,
                severity,
                reason,
                message,
            } => (
                status,
                Json(serde_json::json!({
                    "error": message,
                    "reason": reason,
                    "blockedBy": blocked_by,
                    "severity": severity,
                })),
            )
                .into_response(),
            AppError::NotFound(what) => api_error(status, &format!("{} not found", capitalize(&what))),
            AppError::Unauthorized => api_error(status, "Unauthorized"),
            AppError::DependencyDegraded(ref detail) => {
                error!(detail = %detail, "Degraded dependency escaped to the web layer");
                api_error(status, "Internal server error")
            }
            AppError::Internal(ref e) => {
                error!(error = %e, "Request failed");
                api_error(status, "Internal server error")
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), "anonymous");

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers), "10.0.0.2");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn test_error_statuses() {
        let r = AppError::PayloadTooLarge { size: 2, max: 1 }.into_response();
        assert_eq!(r.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let r = AppError::RateLimitExceeded {
            limit: 1,
            remaining: 0,
            reset_seconds: 42,
        }
        .into_response();
        assert_eq!(r.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(r.headers()[header::RETRY_AFTER], "42");

        let r = AppError::Internal(anyhow::anyhow!("db exploded")).into_response();
        assert_eq!(r.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
