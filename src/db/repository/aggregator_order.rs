//! Aggregator Order Repository
//!
//! The ingestion pipeline and the acceptance engine both run inside
//! transactions, so the writes they need take `&mut SqliteConnection`.

use super::{RepoError, RepoResult};
use crate::db::models::{
    AggregatorOrder, AggregatorOrderDetail, AggregatorOrderItem, EnrichedOrderItem, MappingStatus,
    NewAggregatorOrder, OrderStatus,
};
use crate::utils::{now_millis, snowflake_id};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, store_id, aggregator_id, platform, external_order_id, external_order_number, status, pos_order_id, customer_name, customer_phone, customer_address, subtotal, tax, delivery_fee, discount, total, estimated_minutes, raw_payload, error_message, created_at, accepted_at";

const ITEM_COLUMNS: &str = "id, order_id, item_index, external_item_id, name, quantity, price, pos_item_id, pos_variation_id, mapping_status";

/// Per-status order counts for one aggregator
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderCounts {
    pub total: i64,
    pub pending: i64,
    pub accepted: i64,
    pub mapped_to_pos: i64,
    pub rejected: i64,
    pub failed: i64,
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<AggregatorOrder>> {
    let row = sqlx::query_as::<_, AggregatorOrder>(&format!(
        "SELECT {COLUMNS} FROM aggregator_order WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Dedup probe, run inside the ingestion transaction.
pub async fn find_by_external(
    conn: &mut SqliteConnection,
    aggregator_id: i64,
    external_order_id: &str,
) -> RepoResult<Option<AggregatorOrder>> {
    let row = sqlx::query_as::<_, AggregatorOrder>(&format!(
        "SELECT {COLUMNS} FROM aggregator_order WHERE aggregator_id = ? AND external_order_id = ?"
    ))
    .bind(aggregator_id)
    .bind(external_order_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn list(
    pool: &SqlitePool,
    store_id: i64,
    status: Option<OrderStatus>,
    limit: i64,
) -> RepoResult<Vec<AggregatorOrder>> {
    let rows = match status {
        Some(status) => {
            sqlx::query_as::<_, AggregatorOrder>(&format!(
                "SELECT {COLUMNS} FROM aggregator_order WHERE store_id = ? AND status = ? ORDER BY created_at DESC LIMIT ?"
            ))
            .bind(store_id)
            .bind(status)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, AggregatorOrder>(&format!(
                "SELECT {COLUMNS} FROM aggregator_order WHERE store_id = ? ORDER BY created_at DESC LIMIT ?"
            ))
            .bind(store_id)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}

/// Orders received in the last 24 hours, newest first.
pub async fn recent(pool: &SqlitePool, store_id: i64, now: i64) -> RepoResult<Vec<AggregatorOrder>> {
    let since = now - 24 * 60 * 60 * 1000;
    let rows = sqlx::query_as::<_, AggregatorOrder>(&format!(
        "SELECT {COLUMNS} FROM aggregator_order WHERE store_id = ? AND created_at >= ? ORDER BY created_at DESC"
    ))
    .bind(store_id)
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<AggregatorOrderItem>> {
    let rows = sqlx::query_as::<_, AggregatorOrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM aggregator_order_item WHERE order_id = ? ORDER BY item_index"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Order with lines joined against the POS catalog, for the review screen.
pub async fn find_detail(pool: &SqlitePool, id: i64) -> RepoResult<Option<AggregatorOrderDetail>> {
    let Some(order) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    let items = sqlx::query_as::<_, EnrichedOrderItem>(
        "SELECT oi.id, oi.order_id, oi.item_index, oi.external_item_id, oi.name, oi.quantity, oi.price, oi.pos_item_id, oi.pos_variation_id, oi.mapping_status, mi.name AS pos_item_name, mi.price AS pos_item_price FROM aggregator_order_item oi LEFT JOIN menu_item mi ON mi.id = oi.pos_item_id WHERE oi.order_id = ? ORDER BY oi.item_index",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;
    Ok(Some(AggregatorOrderDetail { order, items }))
}

/// Insert a normalized order and its lines inside the caller's transaction.
/// The order lands in `pending`.
pub async fn insert_with_lines(
    conn: &mut SqliteConnection,
    order: &NewAggregatorOrder,
) -> RepoResult<i64> {
    let id = snowflake_id();
    let now = now_millis();

    sqlx::query(
        "INSERT INTO aggregator_order (id, store_id, aggregator_id, platform, external_order_id, external_order_number, status, customer_name, customer_phone, customer_address, subtotal, tax, delivery_fee, discount, total, estimated_minutes, raw_payload, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(order.store_id)
    .bind(order.aggregator_id)
    .bind(order.platform)
    .bind(&order.external_order_id)
    .bind(&order.external_order_number)
    .bind(OrderStatus::Pending)
    .bind(&order.customer_name)
    .bind(&order.customer_phone)
    .bind(&order.customer_address)
    .bind(order.subtotal)
    .bind(order.tax)
    .bind(order.delivery_fee)
    .bind(order.discount)
    .bind(order.total)
    .bind(order.estimated_minutes)
    .bind(&order.raw_payload)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    for (idx, line) in order.lines.iter().enumerate() {
        sqlx::query(
            "INSERT INTO aggregator_order_item (id, order_id, item_index, external_item_id, name, quantity, price, pos_item_id, pos_variation_id, mapping_status) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(snowflake_id())
        .bind(id)
        .bind(idx as i64)
        .bind(&line.external_item_id)
        .bind(&line.name)
        .bind(line.quantity)
        .bind(line.price)
        .bind(line.pos_item_id)
        .bind(line.pos_variation_id)
        .bind(line.mapping_status)
        .execute(&mut *conn)
        .await?;
    }

    Ok(id)
}

/// Operator resolution of one line on the review screen.
pub async fn update_line_mapping(
    pool: &SqlitePool,
    order_id: i64,
    item_index: i64,
    pos_item_id: i64,
    pos_variation_id: Option<i64>,
) -> RepoResult<AggregatorOrderItem> {
    let result = sqlx::query(
        "UPDATE aggregator_order_item SET pos_item_id = ?, pos_variation_id = ?, mapping_status = ? WHERE order_id = ? AND item_index = ?",
    )
    .bind(pos_item_id)
    .bind(pos_variation_id)
    .bind(MappingStatus::Manual)
    .bind(order_id)
    .bind(item_index)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::Validation(format!(
            "order {order_id} has no line {item_index}"
        )));
    }

    let row = sqlx::query_as::<_, AggregatorOrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM aggregator_order_item WHERE order_id = ? AND item_index = ?"
    ))
    .bind(order_id)
    .bind(item_index)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Current status of an order, readable inside a transaction.
pub async fn status_of(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Option<OrderStatus>> {
    let status = sqlx::query_scalar::<_, OrderStatus>(
        "SELECT status FROM aggregator_order WHERE id = ?",
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(status)
}

/// Final step of acceptance: link the materialized ticket and move the
/// order to its terminal state. Compare-and-set on `pending`: returns
/// false when a concurrent transition got there first, so the caller can
/// roll back instead of committing a second ticket.
pub async fn mark_mapped_to_pos(
    conn: &mut SqliteConnection,
    order_id: i64,
    pos_order_id: i64,
    accepted_at: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE aggregator_order SET status = ?, pos_order_id = ?, accepted_at = ?, error_message = NULL WHERE id = ? AND status = ?",
    )
    .bind(OrderStatus::MappedToPos)
    .bind(pos_order_id)
    .bind(accepted_at)
    .bind(order_id)
    .bind(OrderStatus::Pending)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Compare-and-set `pending -> rejected`. False means the order already
/// left `pending`.
pub async fn mark_rejected(pool: &SqlitePool, order_id: i64, reason: &str) -> RepoResult<bool> {
    let result =
        sqlx::query("UPDATE aggregator_order SET status = ?, error_message = ? WHERE id = ? AND status = ?")
            .bind(OrderStatus::Rejected)
            .bind(reason)
            .bind(order_id)
            .bind(OrderStatus::Pending)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// Compare-and-set `pending -> failed`. False means the order already
/// left `pending`, in particular a committed `mapped_to_pos` is never
/// overwritten by a lost acceptance race.
pub async fn mark_failed(pool: &SqlitePool, order_id: i64, error: &str) -> RepoResult<bool> {
    let result =
        sqlx::query("UPDATE aggregator_order SET status = ?, error_message = ? WHERE id = ? AND status = ?")
            .bind(OrderStatus::Failed)
            .bind(error)
            .bind(order_id)
            .bind(OrderStatus::Pending)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// Compare-and-set `failed -> pending`, clearing the stored error.
pub async fn mark_pending(pool: &SqlitePool, order_id: i64) -> RepoResult<bool> {
    let result =
        sqlx::query("UPDATE aggregator_order SET status = ?, error_message = NULL WHERE id = ? AND status = ?")
            .bind(OrderStatus::Pending)
            .bind(order_id)
            .bind(OrderStatus::Failed)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_by_status(pool: &SqlitePool, aggregator_id: i64) -> RepoResult<OrderCounts> {
    let rows = sqlx::query_as::<_, (OrderStatus, i64)>(
        "SELECT status, COUNT(*) FROM aggregator_order WHERE aggregator_id = ? GROUP BY status",
    )
    .bind(aggregator_id)
    .fetch_all(pool)
    .await?;

    let mut counts = OrderCounts::default();
    for (status, n) in rows {
        counts.total += n;
        match status {
            OrderStatus::Pending => counts.pending = n,
            OrderStatus::Accepted => counts.accepted = n,
            OrderStatus::MappedToPos => counts.mapped_to_pos = n,
            OrderStatus::Rejected => counts.rejected = n,
            OrderStatus::Failed => counts.failed = n,
        }
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{AggregatorCreate, AggregatorCredentials, NewOrderLine, Platform};
    use crate::db::repository::{aggregator, test_support::test_pool};

    async fn seed_aggregator(pool: &SqlitePool) -> i64 {
        aggregator::create(
            pool,
            AggregatorCreate {
                store_id: 1,
                platform: Platform::Swiggy,
                credentials: Some(AggregatorCredentials::default()),
            },
        )
        .await
        .unwrap()
        .id
    }

    fn new_order(aggregator_id: i64, external_id: &str) -> NewAggregatorOrder {
        NewAggregatorOrder {
            store_id: 1,
            aggregator_id,
            platform: Platform::Swiggy,
            external_order_id: external_id.into(),
            external_order_number: "1042".into(),
            customer_name: Some("Asha".into()),
            customer_phone: None,
            customer_address: None,
            subtotal: 250.0,
            tax: 12.5,
            delivery_fee: 30.0,
            discount: 0.0,
            total: 292.5,
            estimated_minutes: Some(25),
            raw_payload: None,
            lines: vec![
                NewOrderLine {
                    external_item_id: "SW-1".into(),
                    name: "Paneer Tikka".into(),
                    quantity: 2,
                    price: 125.0,
                    pos_item_id: Some(7),
                    pos_variation_id: None,
                    mapping_status: MappingStatus::Mapped,
                },
                NewOrderLine {
                    external_item_id: "SW-9".into(),
                    name: "Mystery Item".into(),
                    quantity: 1,
                    price: 0.0,
                    pos_item_id: None,
                    pos_variation_id: None,
                    mapping_status: MappingStatus::Unmapped,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_insert_and_dedup_probe() {
        let pool = test_pool().await;
        let agg = seed_aggregator(&pool).await;

        let mut tx = pool.begin().await.unwrap();
        let id = insert_with_lines(&mut tx, &new_order(agg, "EXT-1")).await.unwrap();
        tx.commit().await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let found = find_by_external(&mut conn, agg, "EXT-1").await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.status, OrderStatus::Pending);
        drop(conn);

        let items = find_items(&pool, id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_index, 0);
        assert_eq!(items[1].mapping_status, MappingStatus::Unmapped);
    }

    #[tokio::test]
    async fn test_unique_violation_on_same_external_order() {
        let pool = test_pool().await;
        let agg = seed_aggregator(&pool).await;

        let mut tx = pool.begin().await.unwrap();
        insert_with_lines(&mut tx, &new_order(agg, "EXT-1")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        let err = insert_with_lines(&mut tx, &new_order(agg, "EXT-1")).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_manual_line_remap() {
        let pool = test_pool().await;
        let agg = seed_aggregator(&pool).await;

        let mut tx = pool.begin().await.unwrap();
        let id = insert_with_lines(&mut tx, &new_order(agg, "EXT-1")).await.unwrap();
        tx.commit().await.unwrap();

        let line = update_line_mapping(&pool, id, 1, 9, None).await.unwrap();
        assert_eq!(line.pos_item_id, Some(9));
        assert_eq!(line.mapping_status, MappingStatus::Manual);

        let err = update_line_mapping(&pool, id, 5, 9, None).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[tokio::test]
    async fn test_retry_clears_error() {
        let pool = test_pool().await;
        let agg = seed_aggregator(&pool).await;

        let mut tx = pool.begin().await.unwrap();
        let id = insert_with_lines(&mut tx, &new_order(agg, "EXT-1")).await.unwrap();
        tx.commit().await.unwrap();

        mark_failed(&pool, id, "boom").await.unwrap();
        let failed = find_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(failed.status, OrderStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("boom"));

        mark_pending(&pool, id).await.unwrap();
        let pending = find_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(pending.status, OrderStatus::Pending);
        assert!(pending.error_message.is_none());
    }

    #[tokio::test]
    async fn test_terminal_state_survives_late_marks() {
        let pool = test_pool().await;
        let agg = seed_aggregator(&pool).await;

        let mut tx = pool.begin().await.unwrap();
        let id = insert_with_lines(&mut tx, &new_order(agg, "EXT-1")).await.unwrap();
        assert!(mark_mapped_to_pos(&mut tx, id, 9000, 1).await.unwrap());
        tx.commit().await.unwrap();

        // The losers of a concurrent accept / reject land after the ticket
        // committed; every mark fails the compare-and-set.
        assert!(!mark_failed(&pool, id, "late loser").await.unwrap());
        assert!(!mark_rejected(&pool, id, "changed my mind").await.unwrap());
        assert!(!mark_pending(&pool, id).await.unwrap());
        {
            let mut conn = pool.acquire().await.unwrap();
            assert!(!mark_mapped_to_pos(&mut conn, id, 9001, 2).await.unwrap());
        }

        let order = find_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::MappedToPos);
        assert_eq!(order.pos_order_id, Some(9000));
        assert!(order.error_message.is_none());
    }

    #[tokio::test]
    async fn test_counts_by_status() {
        let pool = test_pool().await;
        let agg = seed_aggregator(&pool).await;

        for ext in ["A", "B", "C"] {
            let mut tx = pool.begin().await.unwrap();
            insert_with_lines(&mut tx, &new_order(agg, ext)).await.unwrap();
            tx.commit().await.unwrap();
        }
        let orders = list(&pool, 1, None, 50).await.unwrap();
        mark_rejected(&pool, orders[0].id, "no stock").await.unwrap();

        let counts = count_by_status(&pool, agg).await.unwrap();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.pending, 2);
        assert_eq!(counts.rejected, 1);
    }
}
