//! Aggregator Repository

use super::{RepoError, RepoResult};
use crate::db::models::{
    Aggregator, AggregatorCreate, AggregatorStatus, AggregatorUpdate, Platform,
};
use crate::utils::{now_millis, snowflake_id};
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, store_id, platform, is_enabled, api_key, api_secret, restaurant_id, webhook_secret, webhook_url, status, last_sync_at, created_at";

pub async fn find_all(pool: &SqlitePool, store_id: i64) -> RepoResult<Vec<Aggregator>> {
    let rows = sqlx::query_as::<_, Aggregator>(&format!(
        "SELECT {COLUMNS} FROM aggregator WHERE store_id = ? ORDER BY platform"
    ))
    .bind(store_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Aggregator>> {
    let row = sqlx::query_as::<_, Aggregator>(&format!(
        "SELECT {COLUMNS} FROM aggregator WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Webhook routing: find the connection a payload belongs to by the
/// platform it arrived on and the platform-side restaurant id it names.
pub async fn find_by_platform_restaurant(
    pool: &SqlitePool,
    platform: Platform,
    restaurant_id: &str,
) -> RepoResult<Option<Aggregator>> {
    let row = sqlx::query_as::<_, Aggregator>(&format!(
        "SELECT {COLUMNS} FROM aggregator WHERE platform = ? AND restaurant_id = ?"
    ))
    .bind(platform)
    .bind(restaurant_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: AggregatorCreate) -> RepoResult<Aggregator> {
    let id = snowflake_id();
    let now = now_millis();
    let creds = data.credentials.unwrap_or_default();

    sqlx::query(
        "INSERT INTO aggregator (id, store_id, platform, is_enabled, api_key, api_secret, restaurant_id, webhook_secret, status, created_at) VALUES (?, ?, ?, 0, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(data.store_id)
    .bind(data.platform)
    .bind(&creds.api_key)
    .bind(&creds.api_secret)
    .bind(&creds.restaurant_id)
    .bind(&creds.webhook_secret)
    .bind(AggregatorStatus::Inactive)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!(
            "aggregator for platform {} already exists for store {}",
            data.platform, data.store_id
        )),
        other => other,
    })?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create aggregator".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: AggregatorUpdate) -> RepoResult<Aggregator> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("aggregator {id}")))?;

    let creds = data.credentials.unwrap_or_default();
    sqlx::query(
        "UPDATE aggregator SET api_key = COALESCE(?, api_key), api_secret = COALESCE(?, api_secret), restaurant_id = COALESCE(?, restaurant_id), webhook_secret = COALESCE(?, webhook_secret), webhook_url = COALESCE(?, webhook_url), status = COALESCE(?, status) WHERE id = ?",
    )
    .bind(&creds.api_key)
    .bind(&creds.api_secret)
    .bind(&creds.restaurant_id)
    .bind(&creds.webhook_secret)
    .bind(&data.webhook_url)
    .bind(data.status)
    .bind(existing.id)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to update aggregator".into()))
}

/// Flip is_enabled and keep status in step: enabling activates the
/// connection, disabling deactivates it.
pub async fn toggle_enabled(pool: &SqlitePool, id: i64) -> RepoResult<Aggregator> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("aggregator {id}")))?;

    let enabled = !existing.is_enabled;
    let status = if enabled {
        AggregatorStatus::Active
    } else {
        AggregatorStatus::Inactive
    };
    sqlx::query("UPDATE aggregator SET is_enabled = ?, status = ? WHERE id = ?")
        .bind(enabled)
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to toggle aggregator".into()))
}

/// Stamp last_sync_at inside the ingestion transaction.
pub async fn touch_last_sync(
    conn: &mut SqliteConnection,
    id: i64,
    timestamp: i64,
) -> RepoResult<()> {
    sqlx::query("UPDATE aggregator SET last_sync_at = ? WHERE id = ?")
        .bind(timestamp)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Delete a connection together with its mappings and order ledger.
pub async fn delete_cascade(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let existing = find_by_id(pool, id).await?;
    if existing.is_none() {
        return Ok(false);
    }

    let mut tx = pool.begin().await?;
    sqlx::query(
        "DELETE FROM aggregator_order_item WHERE order_id IN (SELECT id FROM aggregator_order WHERE aggregator_id = ?)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM aggregator_order WHERE aggregator_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM item_mapping WHERE aggregator_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM category_mapping WHERE aggregator_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM aggregator WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;

    fn create_dto(store_id: i64, platform: Platform) -> AggregatorCreate {
        AggregatorCreate {
            store_id,
            platform,
            credentials: Some(crate::db::models::AggregatorCredentials {
                restaurant_id: Some("rest-1".into()),
                webhook_secret: Some("secret".into()),
                ..Default::default()
            }),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let pool = test_pool().await;
        let agg = create(&pool, create_dto(1, Platform::Swiggy)).await.unwrap();
        assert_eq!(agg.platform, Platform::Swiggy);
        assert_eq!(agg.status, AggregatorStatus::Inactive);
        assert!(!agg.is_enabled);

        let found = find_by_platform_restaurant(&pool, Platform::Swiggy, "rest-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, agg.id);
    }

    #[tokio::test]
    async fn test_duplicate_platform_rejected() {
        let pool = test_pool().await;
        create(&pool, create_dto(1, Platform::Swiggy)).await.unwrap();
        let err = create(&pool, create_dto(1, Platform::Swiggy)).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
        // Same platform on another store is fine
        create(&pool, create_dto(2, Platform::Swiggy)).await.unwrap();
    }

    #[tokio::test]
    async fn test_toggle_flips_status() {
        let pool = test_pool().await;
        let agg = create(&pool, create_dto(1, Platform::Zomato)).await.unwrap();
        let on = toggle_enabled(&pool, agg.id).await.unwrap();
        assert!(on.is_enabled);
        assert_eq!(on.status, AggregatorStatus::Active);
        let off = toggle_enabled(&pool, agg.id).await.unwrap();
        assert!(!off.is_enabled);
        assert_eq!(off.status, AggregatorStatus::Inactive);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_unset_fields() {
        let pool = test_pool().await;
        let agg = create(&pool, create_dto(1, Platform::Rapido)).await.unwrap();
        let updated = update(
            &pool,
            agg.id,
            AggregatorUpdate {
                webhook_url: Some("https://example.test/hook".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.webhook_url.as_deref(), Some("https://example.test/hook"));
        assert_eq!(updated.restaurant_id.as_deref(), Some("rest-1"));
    }

    #[tokio::test]
    async fn test_delete_missing_returns_false() {
        let pool = test_pool().await;
        assert!(!delete_cascade(&pool, 999).await.unwrap());
    }
}
