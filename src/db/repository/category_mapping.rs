//! Category Mapping Repository

use super::{RepoError, RepoResult};
use crate::db::models::{
    BulkCategoryEntry, BulkImportResult, CategoryMapping, CategoryMappingCreate,
    CategoryMappingUpdate, Platform,
};
use crate::utils::snowflake_id;
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, store_id, aggregator_id, platform, external_category_id, external_category_name, counter_id, is_active";

pub async fn find_all(pool: &SqlitePool, aggregator_id: i64) -> RepoResult<Vec<CategoryMapping>> {
    let rows = sqlx::query_as::<_, CategoryMapping>(&format!(
        "SELECT {COLUMNS} FROM category_mapping WHERE aggregator_id = ? ORDER BY external_category_name"
    ))
    .bind(aggregator_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_store(pool: &SqlitePool, store_id: i64) -> RepoResult<Vec<CategoryMapping>> {
    let rows = sqlx::query_as::<_, CategoryMapping>(&format!(
        "SELECT {COLUMNS} FROM category_mapping WHERE store_id = ? ORDER BY platform, external_category_name"
    ))
    .bind(store_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<CategoryMapping>> {
    let row = sqlx::query_as::<_, CategoryMapping>(&format!(
        "SELECT {COLUMNS} FROM category_mapping WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Counter routing: match a line's external category name against the
/// configured category mappings, case-insensitively.
pub async fn find_counter_for_category(
    conn: &mut SqliteConnection,
    aggregator_id: i64,
    external_category_name: &str,
) -> RepoResult<Option<i64>> {
    let counter_id = sqlx::query_scalar::<_, Option<i64>>(
        "SELECT counter_id FROM category_mapping WHERE aggregator_id = ? AND LOWER(external_category_name) = LOWER(?) AND is_active = 1",
    )
    .bind(aggregator_id)
    .bind(external_category_name)
    .fetch_optional(conn)
    .await?;
    Ok(counter_id.flatten())
}

pub async fn create(pool: &SqlitePool, data: CategoryMappingCreate) -> RepoResult<CategoryMapping> {
    let id = snowflake_id();
    let platform = aggregator_platform(pool, data.aggregator_id).await?;

    sqlx::query(
        "INSERT INTO category_mapping (id, store_id, aggregator_id, platform, external_category_id, external_category_name, counter_id, is_active) VALUES (?, ?, ?, ?, ?, ?, ?, 1)",
    )
    .bind(id)
    .bind(data.store_id)
    .bind(data.aggregator_id)
    .bind(platform)
    .bind(&data.external_category_id)
    .bind(&data.external_category_name)
    .bind(data.counter_id)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!(
            "category mapping for external category {} already exists",
            data.external_category_id
        )),
        other => other,
    })?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create category mapping".into()))
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    data: CategoryMappingUpdate,
) -> RepoResult<CategoryMapping> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("category mapping {id}")))?;

    sqlx::query(
        "UPDATE category_mapping SET external_category_name = COALESCE(?, external_category_name), counter_id = COALESCE(?, counter_id), is_active = COALESCE(?, is_active) WHERE id = ?",
    )
    .bind(&data.external_category_name)
    .bind(data.counter_id)
    .bind(data.is_active)
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to update category mapping".into()))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let result = sqlx::query("DELETE FROM category_mapping WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn bulk_import(
    pool: &SqlitePool,
    store_id: i64,
    aggregator_id: i64,
    entries: Vec<BulkCategoryEntry>,
) -> RepoResult<BulkImportResult> {
    let platform = aggregator_platform(pool, aggregator_id).await?;
    let mut result = BulkImportResult::default();
    let mut tx = pool.begin().await?;

    for entry in entries {
        let done = sqlx::query(
            "INSERT OR IGNORE INTO category_mapping (id, store_id, aggregator_id, platform, external_category_id, external_category_name, counter_id, is_active) VALUES (?, ?, ?, ?, ?, ?, ?, 1)",
        )
        .bind(snowflake_id())
        .bind(store_id)
        .bind(aggregator_id)
        .bind(platform)
        .bind(&entry.external_category_id)
        .bind(&entry.external_category_name)
        .bind(entry.counter_id)
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

pub async fn count(pool: &SqlitePool, aggregator_id: i64) -> RepoResult<i64> {
    let n = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM category_mapping WHERE aggregator_id = ?",
    )
    .bind(aggregator_id)
    .fetch_one(pool)
    .await?;
    Ok(n)
}

async fn aggregator_platform(pool: &SqlitePool, aggregator_id: i64) -> RepoResult<Platform> {
    let platform = sqlx::query_scalar::<_, Platform>("SELECT platform FROM aggregator WHERE id = ?")
        .bind(aggregator_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("aggregator {aggregator_id}")))?;
    Ok(platform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{AggregatorCreate, AggregatorCredentials};
    use crate::db::repository::{aggregator, test_support::test_pool};

    async fn seed_aggregator(pool: &SqlitePool) -> i64 {
        aggregator::create(
            pool,
            AggregatorCreate {
                store_id: 1,
                platform: Platform::Zomato,
                credentials: Some(AggregatorCredentials::default()),
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_counter_lookup_is_case_insensitive() {
        let pool = test_pool().await;
        let agg = seed_aggregator(&pool).await;
        create(
            &pool,
            CategoryMappingCreate {
                store_id: 1,
                aggregator_id: agg,
                external_category_id: "CAT-1".into(),
                external_category_name: "Starters".into(),
                counter_id: Some(42),
            },
        )
        .await
        .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let counter = find_counter_for_category(&mut conn, agg, "STARTERS").await.unwrap();
        assert_eq!(counter, Some(42));
        let none = find_counter_for_category(&mut conn, agg, "Desserts").await.unwrap();
        assert_eq!(none, None);
    }

    #[tokio::test]
    async fn test_duplicate_external_category_rejected() {
        let pool = test_pool().await;
        let agg = seed_aggregator(&pool).await;
        let dto = CategoryMappingCreate {
            store_id: 1,
            aggregator_id: agg,
            external_category_id: "CAT-1".into(),
            external_category_name: "Starters".into(),
            counter_id: None,
        };
        create(&pool, dto.clone()).await.unwrap();
        let err = create(&pool, dto).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }
}
