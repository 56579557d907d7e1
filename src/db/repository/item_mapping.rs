//! Item Mapping Repository

use super::{RepoError, RepoResult};
use crate::db::models::{
    BulkImportResult, BulkItemEntry, ItemMapping, ItemMappingCreate, ItemMappingUpdate,
    ItemMappingWithPos, MappingType, Platform,
};
use crate::utils::snowflake_id;
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, store_id, aggregator_id, platform, external_item_id, external_item_name, external_category, pos_item_id, pos_variation_id, mapping_type, is_active";

const JOINED_COLUMNS: &str = "im.id, im.store_id, im.aggregator_id, im.platform, im.external_item_id, im.external_item_name, im.external_category, im.pos_item_id, im.pos_variation_id, im.mapping_type, im.is_active, mi.name AS pos_item_name, mi.price AS pos_item_price";

pub async fn find_all(
    pool: &SqlitePool,
    aggregator_id: i64,
) -> RepoResult<Vec<ItemMappingWithPos>> {
    let rows = sqlx::query_as::<_, ItemMappingWithPos>(&format!(
        "SELECT {JOINED_COLUMNS} FROM item_mapping im LEFT JOIN menu_item mi ON mi.id = im.pos_item_id WHERE im.aggregator_id = ? ORDER BY im.external_item_name"
    ))
    .bind(aggregator_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_store(
    pool: &SqlitePool,
    store_id: i64,
) -> RepoResult<Vec<ItemMappingWithPos>> {
    let rows = sqlx::query_as::<_, ItemMappingWithPos>(&format!(
        "SELECT {JOINED_COLUMNS} FROM item_mapping im LEFT JOIN menu_item mi ON mi.id = im.pos_item_id WHERE im.store_id = ? ORDER BY im.platform, im.external_item_name"
    ))
    .bind(store_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<ItemMapping>> {
    let row = sqlx::query_as::<_, ItemMapping>(&format!(
        "SELECT {COLUMNS} FROM item_mapping WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Used by the ingestion pipeline to resolve a line against the catalog.
/// Only active mappings count.
pub async fn find_active_by_external(
    conn: &mut SqliteConnection,
    aggregator_id: i64,
    external_item_id: &str,
) -> RepoResult<Option<ItemMapping>> {
    let row = sqlx::query_as::<_, ItemMapping>(&format!(
        "SELECT {COLUMNS} FROM item_mapping WHERE aggregator_id = ? AND external_item_id = ? AND is_active = 1"
    ))
    .bind(aggregator_id)
    .bind(external_item_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: ItemMappingCreate) -> RepoResult<ItemMapping> {
    let id = snowflake_id();
    let platform = aggregator_platform(pool, data.aggregator_id).await?;
    let mapping_type = data.mapping_type.unwrap_or(MappingType::Item);

    sqlx::query(
        "INSERT INTO item_mapping (id, store_id, aggregator_id, platform, external_item_id, external_item_name, external_category, pos_item_id, pos_variation_id, mapping_type, is_active) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)",
    )
    .bind(id)
    .bind(data.store_id)
    .bind(data.aggregator_id)
    .bind(platform)
    .bind(&data.external_item_id)
    .bind(&data.external_item_name)
    .bind(&data.external_category)
    .bind(data.pos_item_id)
    .bind(data.pos_variation_id)
    .bind(mapping_type)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!(
            "item mapping for external item {} already exists",
            data.external_item_id
        )),
        other => other,
    })?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create item mapping".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: ItemMappingUpdate) -> RepoResult<ItemMapping> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("item mapping {id}")))?;

    sqlx::query(
        "UPDATE item_mapping SET external_item_name = COALESCE(?, external_item_name), external_category = COALESCE(?, external_category), pos_item_id = COALESCE(?, pos_item_id), pos_variation_id = COALESCE(?, pos_variation_id), mapping_type = COALESCE(?, mapping_type), is_active = COALESCE(?, is_active) WHERE id = ?",
    )
    .bind(&data.external_item_name)
    .bind(&data.external_category)
    .bind(data.pos_item_id)
    .bind(data.pos_variation_id)
    .bind(data.mapping_type)
    .bind(data.is_active)
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to update item mapping".into()))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let result = sqlx::query("DELETE FROM item_mapping WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Bulk import from a platform catalog export. Entries whose external id
/// already exists are counted as skipped, never overwritten.
pub async fn bulk_import(
    pool: &SqlitePool,
    store_id: i64,
    aggregator_id: i64,
    entries: Vec<BulkItemEntry>,
) -> RepoResult<BulkImportResult> {
    let platform = aggregator_platform(pool, aggregator_id).await?;
    let mut result = BulkImportResult::default();
    let mut tx = pool.begin().await?;

    for entry in entries {
        let done = sqlx::query(
            "INSERT OR IGNORE INTO item_mapping (id, store_id, aggregator_id, platform, external_item_id, external_item_name, external_category, pos_item_id, pos_variation_id, mapping_type, is_active) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'item', 1)",
        )
        .bind(snowflake_id())
        .bind(store_id)
        .bind(aggregator_id)
        .bind(platform)
        .bind(&entry.external_item_id)
        .bind(&entry.external_item_name)
        .bind(&entry.external_category)
        .bind(entry.pos_item_id)
        .bind(entry.pos_variation_id)
        .execute(&mut *tx)
        .await?;
        if done.rows_affected() > 0 {
            result.created += 1;
        } else {
            result.skipped += 1;
        }
    }

    tx.commit().await?;
    Ok(result)
}

/// Mappings still missing a POS item, the input set of auto-mapping.
pub async fn find_unmapped(pool: &SqlitePool, aggregator_id: i64) -> RepoResult<Vec<ItemMapping>> {
    let rows = sqlx::query_as::<_, ItemMapping>(&format!(
        "SELECT {COLUMNS} FROM item_mapping WHERE aggregator_id = ? AND pos_item_id IS NULL AND is_active = 1"
    ))
    .bind(aggregator_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// (total, mapped) counts for the stats endpoint.
pub async fn counts(pool: &SqlitePool, aggregator_id: i64) -> RepoResult<(i64, i64)> {
    let row = sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*), COUNT(pos_item_id) FROM item_mapping WHERE aggregator_id = ?",
    )
    .bind(aggregator_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn set_pos_item(pool: &SqlitePool, id: i64, pos_item_id: i64) -> RepoResult<()> {
    sqlx::query("UPDATE item_mapping SET pos_item_id = ? WHERE id = ?")
        .bind(pos_item_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

async fn aggregator_platform(pool: &SqlitePool, aggregator_id: i64) -> RepoResult<Platform> {
    let platform = sqlx::query_scalar::<_, Platform>("SELECT platform FROM aggregator WHERE id = ?")
        .bind(aggregator_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("aggregator {aggregator_id}")))?;
    Ok(platform)
}
