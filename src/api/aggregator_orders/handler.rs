//! Aggregator Order Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::{
    AggregatorOrder, AggregatorOrderDetail, AggregatorOrderItem, OrderStatus,
};
use crate::db::repository::aggregator_order;
use crate::engine::{AcceptResult, accept_order, lifecycle};
use crate::utils::error::{AppResponse, ok, ok_with_message};
use crate::utils::{AppError, AppResult, now_millis};

const DEFAULT_LIST_LIMIT: i64 = 100;

#[derive(Deserialize)]
pub struct ListQuery {
    pub store_id: i64,
    pub status: Option<OrderStatus>,
    pub limit: Option<i64>,
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<Vec<AggregatorOrder>>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, 500);
    let rows = aggregator_order::list(state.pool(), query.store_id, query.status, limit).await?;
    Ok(ok(rows))
}

#[derive(Deserialize)]
pub struct RecentQuery {
    pub store_id: i64,
}

pub async fn recent(
    State(state): State<ServerState>,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<AppResponse<Vec<AggregatorOrder>>>> {
    let rows = aggregator_order::recent(state.pool(), query.store_id, now_millis()).await?;
    Ok(ok(rows))
}

pub async fn get_one(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<AggregatorOrderDetail>>> {
    let detail = aggregator_order::find_detail(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("order {id}")))?;
    Ok(ok(detail))
}

pub async fn accept(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<AcceptResult>>> {
    let result = accept_order(
        state.pool(),
        id,
        state.business_now(),
        state.config.business_day_cutoff,
    )
    .await
    .map_err(AppError::from)?;
    Ok(ok_with_message(result, "Order accepted"))
}

#[derive(Deserialize, Default)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

pub async fn reject(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    payload: Option<Json<RejectRequest>>,
) -> AppResult<Json<AppResponse<AggregatorOrder>>> {
    let reason = payload.and_then(|Json(p)| p.reason);
    let order = lifecycle::reject_order(state.pool(), id, reason)
        .await
        .map_err(AppError::from)?;
    Ok(ok_with_message(order, "Order rejected"))
}

pub async fn retry(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<AggregatorOrder>>> {
    let order = lifecycle::retry_order(state.pool(), id)
        .await
        .map_err(AppError::from)?;
    Ok(ok_with_message(order, "Order returned to pending"))
}

#[derive(Deserialize)]
pub struct RemapRequest {
    pub pos_item_id: i64,
    pub pos_variation_id: Option<i64>,
}

pub async fn remap_line(
    State(state): State<ServerState>,
    Path((id, index)): Path<(i64, i64)>,
    Json(payload): Json<RemapRequest>,
) -> AppResult<Json<AppResponse<AggregatorOrderItem>>> {
    let line = lifecycle::remap_line(
        state.pool(),
        id,
        index,
        payload.pos_item_id,
        payload.pos_variation_id,
    )
    .await
    .map_err(AppError::from)?;
    Ok(ok(line))
}
