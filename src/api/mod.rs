//! HTTP API
//!
//! One sub-module per feature, each exposing a `router()`. The webhook
//! routes speak the platforms' own envelope, everything under `/api`
//! uses the unified `AppResponse` envelope.

use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

pub mod aggregator_orders;
pub mod aggregators;
pub mod health;
pub mod mappings;
pub mod webhook;

/// All routes, no middleware and no state. Tests bind this directly.
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(webhook::router())
        .merge(aggregators::router())
        .merge(mappings::router())
        .merge(aggregator_orders::router())
}

/// Fully configured application used by the HTTP server.
pub fn build_app(state: ServerState) -> Router {
    build_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}
