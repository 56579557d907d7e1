//! Aggregator Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::{Aggregator, AggregatorCreate, AggregatorUpdate};
use crate::db::repository::aggregator_order::OrderCounts;
use crate::db::repository::{aggregator, aggregator_order, category_mapping, item_mapping};
use crate::engine::{AutoMapResult, auto_map_by_name};
use crate::utils::error::{AppResponse, ok, ok_with_message};
use crate::utils::{AppError, AppResult};

#[derive(Deserialize)]
pub struct ListQuery {
    pub store_id: i64,
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<Vec<Aggregator>>>> {
    let rows = aggregator::find_all(state.pool(), query.store_id).await?;
    Ok(ok(rows))
}

pub async fn get_one(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<Aggregator>>> {
    let agg = aggregator::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("aggregator {id}")))?;
    Ok(ok(agg))
}

/// Mapping and order counts for the settings screen
#[derive(Serialize)]
pub struct AggregatorStats {
    pub item_mappings: i64,
    pub item_mappings_mapped: i64,
    pub category_mappings: i64,
    pub orders: OrderCounts,
}

pub async fn stats(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<AggregatorStats>>> {
    aggregator::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("aggregator {id}")))?;

    let (item_mappings, item_mappings_mapped) = item_mapping::counts(state.pool(), id).await?;
    let category_mappings = category_mapping::count(state.pool(), id).await?;
    let orders = aggregator_order::count_by_status(state.pool(), id).await?;
    Ok(ok(AggregatorStats {
        item_mappings,
        item_mappings_mapped,
        category_mappings,
        orders,
    }))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<AggregatorCreate>,
) -> AppResult<Json<AppResponse<Aggregator>>> {
    let agg = aggregator::create(state.pool(), payload).await?;
    Ok(ok_with_message(agg, "Aggregator created"))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<AggregatorUpdate>,
) -> AppResult<Json<AppResponse<Aggregator>>> {
    let agg = aggregator::update(state.pool(), id, payload).await?;
    Ok(ok(agg))
}

pub async fn toggle_enabled(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<Aggregator>>> {
    let agg = aggregator::toggle_enabled(state.pool(), id).await?;
    Ok(ok(agg))
}

pub async fn remove(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<bool>>> {
    let deleted = aggregator::delete_cascade(state.pool(), id).await?;
    if !deleted {
        return Err(AppError::not_found(format!("aggregator {id}")));
    }
    Ok(ok_with_message(true, "Aggregator deleted"))
}

pub async fn auto_map(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<AutoMapResult>>> {
    let result = auto_map_by_name(state.pool(), id).await.map_err(AppError::from)?;
    Ok(ok(result))
}
