//! POS Catalog Reads
//!
//! The acceptance engine and auto-mapper only read the catalog, the POS
//! owns the writes.

use super::RepoResult;
use crate::db::models::{ItemVariation, MenuItem, Platform};
use sqlx::{SqliteConnection, SqlitePool};

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<MenuItem>> {
    let row = sqlx::query_as::<_, MenuItem>(
        "SELECT id, store_id, name, price, is_available FROM menu_item WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn find_all(pool: &SqlitePool, store_id: i64) -> RepoResult<Vec<MenuItem>> {
    let rows = sqlx::query_as::<_, MenuItem>(
        "SELECT id, store_id, name, price, is_available FROM menu_item WHERE store_id = ? ORDER BY name",
    )
    .bind(store_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_variation(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<ItemVariation>> {
    let row = sqlx::query_as::<_, ItemVariation>(
        "SELECT id, menu_item_id, name, price, is_active FROM item_variation WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Platform-specific price override for a menu item, if one is configured.
pub async fn platform_price(
    conn: &mut SqliteConnection,
    menu_item_id: i64,
    platform: Platform,
) -> RepoResult<Option<f64>> {
    let price = sqlx::query_scalar::<_, f64>(
        "SELECT price FROM menu_item_platform_price WHERE menu_item_id = ? AND platform = ?",
    )
    .bind(menu_item_id)
    .bind(platform)
    .fetch_optional(conn)
    .await?;
    Ok(price)
}
