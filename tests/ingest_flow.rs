//! End-to-end flow: webhook delivery through acceptance.
//!
//! Exercises the real router over an in-memory database, the same way a
//! platform and an operator would drive it.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use dhaba_edge::api;
use dhaba_edge::core::{Config, ServerState};
use dhaba_edge::db::models::{MappingStatus, OrderStatus, Platform};
use dhaba_edge::db::repository::{aggregator_order, pos_order};
use dhaba_edge::engine::{accept_order, lifecycle};
use dhaba_edge::ingest::signature;

async fn test_state() -> (ServerState, SqlitePool) {
    // One connection only, every `:memory:` connection is its own database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    let state = ServerState::from_pool(pool.clone(), Config::for_tests());
    (state, pool)
}

fn app(state: ServerState) -> Router {
    api::build_router().with_state(state)
}

async fn seed_store(pool: &SqlitePool) -> i64 {
    sqlx::query(
        "INSERT INTO aggregator (id, store_id, platform, is_enabled, restaurant_id, webhook_secret, status, created_at) VALUES (100, 1, 'swiggy', 1, 'rest-1', 'topsecret', 'active', 0)",
    )
    .execute(pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO menu_item (id, store_id, name, price) VALUES (7, 1, 'Paneer Tikka', 120)")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO menu_item (id, store_id, name, price) VALUES (8, 1, 'Dal Makhani', 95)")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO item_mapping (id, store_id, aggregator_id, platform, external_item_id, external_item_name, pos_item_id, mapping_type, is_active) VALUES (200, 1, 100, 'swiggy', 'SW-1', 'Paneer Tikka', 7, 'item', 1)",
    )
    .execute(pool)
    .await
    .unwrap();
    100
}

fn order_payload() -> Value {
    json!({
        "order_id": "SW-ORDER-1",
        "order_number": "1042",
        "restaurant_id": "rest-1",
        "customer": { "name": "Asha", "phone": "9999" },
        "items": [
            { "id": "SW-1", "name": "Paneer Tikka", "quantity": 2, "price": 140.0 },
            { "id": "SW-2", "name": "Dal Makhani", "quantity": 1, "price": 95.0 }
        ],
        "subtotal": 375.0,
        "tax": 18.75,
        "delivery_fee": 30.0,
        "total": 423.75
    })
}

async fn post_webhook(app: &Router, body: &str, sig: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri("/webhook/swiggy")
        .header("content-type", "application/json");
    if let Some(sig) = sig {
        request = request.header("x-swiggy-signature", sig);
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

#[tokio::test]
async fn invalid_json_gets_the_original_envelope() {
    let (state, pool) = test_state().await;
    seed_store(&pool).await;
    let app = app(state);

    let (status, body) = post_webhook(&app, "not json{", Some("irrelevant")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid JSON payload" }));
}

#[tokio::test]
async fn unsigned_delivery_is_rejected_when_secret_is_set() {
    let (state, pool) = test_state().await;
    seed_store(&pool).await;
    let app = app(state);
    let body = order_payload().to_string();

    let (status, resp) = post_webhook(&app, &body, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["error"], "Invalid signature");

    let (status, _) = post_webhook(&app, &body, Some("deadbeef")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_restaurant_is_404() {
    let (state, pool) = test_state().await;
    seed_store(&pool).await;
    let app = app(state);

    let mut payload = order_payload();
    payload["restaurant_id"] = json!("rest-unknown");
    let body = payload.to_string();
    let sig = signature::sign("topsecret", body.as_bytes());

    let (status, resp) = post_webhook(&app, &body, Some(&sig)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["error"], "No aggregator configured for this restaurant");
}

#[tokio::test]
async fn redelivery_is_idempotent() {
    let (state, pool) = test_state().await;
    seed_store(&pool).await;
    let app = app(state);
    let body = order_payload().to_string();
    let sig = signature::sign("topsecret", body.as_bytes());

    let (status, first) = post_webhook(&app, &body, Some(&sig)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    assert_eq!(first["isDuplicate"], false);

    let (status, second) = post_webhook(&app, &body, Some(&sig)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["isDuplicate"], true);
    assert_eq!(second["orderId"], first["orderId"]);

    let orders = aggregator_order::list(&pool, 1, None, 50).await.unwrap();
    assert_eq!(orders.len(), 1);
}

#[tokio::test]
async fn two_line_order_through_manual_remap_and_acceptance() {
    let (state, pool) = test_state().await;
    seed_store(&pool).await;
    let app = app(state.clone());
    let body = order_payload().to_string();
    let sig = signature::sign("topsecret", body.as_bytes());

    // Ingest: line SW-1 is mapped, SW-2 is not
    let (status, resp) = post_webhook(&app, &body, Some(&sig)).await;
    assert_eq!(status, StatusCode::OK);
    let order_id = resp["orderId"].as_i64().unwrap();

    let items = aggregator_order::find_items(&pool, order_id).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].mapping_status, MappingStatus::Mapped);
    assert_eq!(items[1].mapping_status, MappingStatus::Unmapped);

    // Premature acceptance must not create a ticket
    let err = accept_order(
        &pool,
        order_id,
        state.business_now(),
        state.config.business_day_cutoff,
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("1 line(s) still unmapped"));
    let order = aggregator_order::find_by_id(&pool, order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.pos_order_id.is_none());

    // Operator resolves the second line, then accepts
    lifecycle::remap_line(&pool, order_id, 1, 8, None).await.unwrap();
    let result = accept_order(
        &pool,
        order_id,
        state.business_now(),
        state.config.business_day_cutoff,
    )
    .await
    .unwrap();
    assert_eq!(result.token_number, 1);
    assert!(result.order_number.starts_with("SWI-"));
    assert!(result.order_number.ends_with("-1042"));

    let order = aggregator_order::find_by_id(&pool, order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::MappedToPos);
    assert_eq!(order.pos_order_id, Some(result.pos_order_id));

    // Both lines materialized; base prices win because no overrides exist
    let pos_items = pos_order::find_items(&pool, result.pos_order_id).await.unwrap();
    assert_eq!(pos_items.len(), 2);
    assert_eq!(pos_items[0].price, 120.0);
    assert_eq!(pos_items[0].item_total, 240.0);
    assert_eq!(pos_items[1].price, 95.0);

    let pos = pos_order::find_by_id(&pool, result.pos_order_id).await.unwrap().unwrap();
    assert_eq!(pos.source_platform, Some(Platform::Swiggy));
    assert_eq!(pos.external_order_id.as_deref(), Some("SW-ORDER-1"));
}

#[tokio::test]
async fn order_detail_endpoint_enriches_lines() {
    let (state, pool) = test_state().await;
    seed_store(&pool).await;
    let app = app(state);
    let body = order_payload().to_string();
    let sig = signature::sign("topsecret", body.as_bytes());
    let (_, resp) = post_webhook(&app, &body, Some(&sig)).await;
    let order_id = resp["orderId"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/orders/{order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["code"], "E0000");
    let items = value["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    // The mapped line carries its POS item name from the join
    assert_eq!(items[0]["pos_item_name"], "Paneer Tikka");
    assert_eq!(items[1]["pos_item_name"], Value::Null);
}
