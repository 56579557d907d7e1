//! Aggregator Routes

mod handler;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/aggregators", get(handler::list))
        .route("/api/aggregators", post(handler::create))
        .route("/api/aggregators/{id}", get(handler::get_one))
        .route("/api/aggregators/{id}", put(handler::update))
        .route("/api/aggregators/{id}", delete(handler::remove))
        .route("/api/aggregators/{id}/stats", get(handler::stats))
        .route("/api/aggregators/{id}/toggle-enabled", post(handler::toggle_enabled))
        .route("/api/aggregators/{id}/auto-map", post(handler::auto_map))
}
