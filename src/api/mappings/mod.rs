//! Catalog Mapping Routes

mod handler;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/mappings/items", get(handler::list_items))
        .route("/api/mappings/items", post(handler::create_item))
        .route("/api/mappings/items/{id}", put(handler::update_item))
        .route("/api/mappings/items/{id}", delete(handler::delete_item))
        .route("/api/mappings/items/bulk", post(handler::bulk_items))
        .route("/api/mappings/categories", get(handler::list_categories))
        .route("/api/mappings/categories", post(handler::create_category))
        .route("/api/mappings/categories/{id}", put(handler::update_category))
        .route("/api/mappings/categories/{id}", delete(handler::delete_category))
        .route("/api/mappings/categories/bulk", post(handler::bulk_categories))
}
