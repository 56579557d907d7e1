//! Webhook Handlers
//!
//! Signature verification runs over the raw body bytes before any JSON
//! parsing, so the handlers take the body as a `String` and parse it
//! themselves.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{Value, json};
use tracing::warn;

use crate::core::ServerState;
use crate::db::models::Platform;
use crate::db::repository::aggregator;
use crate::ingest::{self, IngestError, signature};
use crate::utils::now_millis;

pub async fn swiggy(state: State<ServerState>, headers: HeaderMap, body: String) -> Response {
    handle(state, Platform::Swiggy, headers, body).await
}

pub async fn zomato(state: State<ServerState>, headers: HeaderMap, body: String) -> Response {
    handle(state, Platform::Zomato, headers, body).await
}

pub async fn rapido(state: State<ServerState>, headers: HeaderMap, body: String) -> Response {
    handle(state, Platform::Rapido, headers, body).await
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": now_millis(),
        "endpoints": Platform::ALL.map(|p| p.webhook_path()),
    }))
}

async fn handle(
    State(state): State<ServerState>,
    platform: Platform,
    headers: HeaderMap,
    body: String,
) -> Response {
    let Ok(payload) = serde_json::from_str::<Value>(&body) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid JSON payload");
    };

    let incoming = match ingest::normalize(platform, &payload, &body) {
        Ok(order) => order,
        Err(IngestError::BadPayload(msg)) => {
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
        Err(IngestError::Repo(e)) => return repo_error_response(e),
    };

    let agg = match aggregator::find_by_platform_restaurant(
        state.pool(),
        platform,
        &incoming.restaurant_id,
    )
    .await
    {
        Ok(Some(agg)) => agg,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                "No aggregator configured for this restaurant",
            );
        }
        Err(e) => return repo_error_response(e),
    };

    if !agg.is_enabled {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "Aggregator is disabled");
    }

    match &agg.webhook_secret {
        Some(secret) => {
            let valid = headers
                .get(platform.signature_header())
                .and_then(|v| v.to_str().ok())
                .is_some_and(|sig| signature::verify(secret, body.as_bytes(), sig));
            if !valid {
                return error_response(StatusCode::UNAUTHORIZED, "Invalid signature");
            }
        }
        None if state.config.require_webhook_signatures => {
            return error_response(StatusCode::UNAUTHORIZED, "Webhook secret not configured");
        }
        None => {
            warn!(
                aggregator_id = agg.id,
                %platform,
                "no webhook secret configured, accepting unsigned delivery"
            );
        }
    }

    match ingest::ingest(state.pool(), &agg, incoming).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "orderId": outcome.order_id,
                "isDuplicate": outcome.is_duplicate,
            })),
        )
            .into_response(),
        Err(IngestError::BadPayload(msg)) => error_response(StatusCode::BAD_REQUEST, &msg),
        Err(IngestError::Repo(e)) => repo_error_response(e),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn repo_error_response(e: crate::db::repository::RepoError) -> Response {
    warn!(error = %e, "webhook processing hit a database error");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
}
