//! Aggregator Order Routes

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders", get(handler::list))
        .route("/api/orders/recent", get(handler::recent))
        .route("/api/orders/{id}", get(handler::get_one))
        .route("/api/orders/{id}/accept", post(handler::accept))
        .route("/api/orders/{id}/reject", post(handler::reject))
        .route("/api/orders/{id}/retry", post(handler::retry))
        .route(
            "/api/orders/{id}/items/{index}/mapping",
            put(handler::remap_line),
        )
}
