//! Catalog Mapping Handlers
//!
//! Lists take either `aggregator_id` or `store_id`, exactly one of them.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::{
    BulkCategoryEntry, BulkImportResult, BulkItemEntry, CategoryMapping, CategoryMappingCreate,
    CategoryMappingUpdate, ItemMapping, ItemMappingCreate, ItemMappingUpdate, ItemMappingWithPos,
};
use crate::db::repository::{category_mapping, item_mapping};
use crate::utils::error::{AppResponse, ok, ok_with_message};
use crate::utils::{AppError, AppResult};

#[derive(Deserialize)]
pub struct ListQuery {
    pub aggregator_id: Option<i64>,
    pub store_id: Option<i64>,
}

pub async fn list_items(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<Vec<ItemMappingWithPos>>>> {
    let rows = match (query.aggregator_id, query.store_id) {
        (Some(aggregator_id), None) => {
            item_mapping::find_all(state.pool(), aggregator_id).await?
        }
        (None, Some(store_id)) => item_mapping::find_by_store(state.pool(), store_id).await?,
        _ => {
            return Err(AppError::validation(
                "exactly one of aggregator_id or store_id is required",
            ));
        }
    };
    Ok(ok(rows))
}

pub async fn create_item(
    State(state): State<ServerState>,
    Json(payload): Json<ItemMappingCreate>,
) -> AppResult<Json<AppResponse<ItemMapping>>> {
    let mapping = item_mapping::create(state.pool(), payload).await?;
    Ok(ok_with_message(mapping, "Item mapping created"))
}

pub async fn update_item(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ItemMappingUpdate>,
) -> AppResult<Json<AppResponse<ItemMapping>>> {
    let mapping = item_mapping::update(state.pool(), id, payload).await?;
    Ok(ok(mapping))
}

pub async fn delete_item(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<bool>>> {
    if !item_mapping::delete(state.pool(), id).await? {
        return Err(AppError::not_found(format!("item mapping {id}")));
    }
    Ok(ok(true))
}

#[derive(Deserialize)]
pub struct BulkItemsRequest {
    pub store_id: i64,
    pub aggregator_id: i64,
    pub entries: Vec<BulkItemEntry>,
}

pub async fn bulk_items(
    State(state): State<ServerState>,
    Json(payload): Json<BulkItemsRequest>,
) -> AppResult<Json<AppResponse<BulkImportResult>>> {
    let result = item_mapping::bulk_import(
        state.pool(),
        payload.store_id,
        payload.aggregator_id,
        payload.entries,
    )
    .await?;
    Ok(ok(result))
}

pub async fn list_categories(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<Vec<CategoryMapping>>>> {
    let rows = match (query.aggregator_id, query.store_id) {
        (Some(aggregator_id), None) => {
            category_mapping::find_all(state.pool(), aggregator_id).await?
        }
        (None, Some(store_id)) => category_mapping::find_by_store(state.pool(), store_id).await?,
        _ => {
            return Err(AppError::validation(
                "exactly one of aggregator_id or store_id is required",
            ));
        }
    };
    Ok(ok(rows))
}

pub async fn create_category(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryMappingCreate>,
) -> AppResult<Json<AppResponse<CategoryMapping>>> {
    let mapping = category_mapping::create(state.pool(), payload).await?;
    Ok(ok_with_message(mapping, "Category mapping created"))
}

pub async fn update_category(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryMappingUpdate>,
) -> AppResult<Json<AppResponse<CategoryMapping>>> {
    let mapping = category_mapping::update(state.pool(), id, payload).await?;
    Ok(ok(mapping))
}

pub async fn delete_category(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<bool>>> {
    if !category_mapping::delete(state.pool(), id).await? {
        return Err(AppError::not_found(format!("category mapping {id}")));
    }
    Ok(ok(true))
}

#[derive(Deserialize)]
pub struct BulkCategoriesRequest {
    pub store_id: i64,
    pub aggregator_id: i64,
    pub entries: Vec<BulkCategoryEntry>,
}

pub async fn bulk_categories(
    State(state): State<ServerState>,
    Json(payload): Json<BulkCategoriesRequest>,
) -> AppResult<Json<AppResponse<BulkImportResult>>> {
    let result = category_mapping::bulk_import(
        state.pool(),
        payload.store_id,
        payload.aggregator_id,
        payload.entries,
    )
    .await?;
    Ok(ok(result))
}
