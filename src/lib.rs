pub mod config;
pub mod error;
pub mod state;
pub mod auth;
pub mod db;
pub mod models;
pub mod middleware;
pub mod net;
pub mod money;
pub mod access;
pub mod reports;
pub mod rpc;
pub mod routes;
pub mod views;
pub mod marketing;
pub mod offline;
pub mod rate_limit;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use sqlx::PgPool;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::marketing::SinkRegistry;
use crate::rate_limit::PinRateLimiter;
use crate::state::{AppState, SharedState};

pub fn build_app(pool: PgPool, config: Config) -> Router {
    let state = build_state(pool, config);
    router(state)
}

pub fn build_state(pool: PgPool, config: Config) -> SharedState {
    let marketing = SinkRegistry::from_config(&config.marketing);
    for sink in marketing.list() {
        if sink.is_configured() {
            tracing::info!("Marketing sink '{}' enabled", sink.id());
        }
    }

    Arc::new(AppState {
        pool,
        config,
        marketing,
        pin_limiter: PinRateLimiter::new(),
    })
}

pub fn router(state: SharedState) -> Router {
    let max_body_size = state.config.max_body_size;

    Router::new()
        .merge(routes::api_routes())
        .merge(rpc::rpc_routes())
        .merge(views::view_routes())
        .route("/health", get(health))
        .route("/api/health", get(api_health))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn api_health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
