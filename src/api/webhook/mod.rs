//! Webhook Routes
//!
//! Public endpoints the delivery platforms POST orders to. These speak
//! the platforms' own envelope (`{"error": ...}` / `{"success": ...}`),
//! not the `/api` response envelope.

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/webhook/swiggy", post(handler::swiggy))
        .route("/webhook/zomato", post(handler::zomato))
        .route("/webhook/rapido", post(handler::rapido))
        .route("/webhook/health", get(handler::health))
}
