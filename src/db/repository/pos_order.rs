//! POS Order Repository
//!
//! Writes run inside the acceptance transaction so that the ticket either
//! fully materializes or not at all.

use super::RepoResult;
use crate::db::models::{NewPosOrder, PosOrder, PosOrderItem};
use crate::utils::{now_millis, snowflake_id};
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, store_id, order_number, token_number, order_type, status, payment_status, customer_name, customer_phone, customer_address, source_platform, external_order_id, subtotal, tax, discount, total, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<PosOrder>> {
    let row = sqlx::query_as::<_, PosOrder>(&format!(
        "SELECT {COLUMNS} FROM pos_order WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<PosOrderItem>> {
    let rows = sqlx::query_as::<_, PosOrderItem>(
        "SELECT id, order_id, menu_item_id, name, price, quantity, status, variation_id, variation_name, variation_price, counter_id, item_total FROM pos_order_item WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Number of tickets created for this store since the given instant. The
/// next kitchen token is one more than this.
pub async fn count_since(
    conn: &mut SqliteConnection,
    store_id: i64,
    since_millis: i64,
) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM pos_order WHERE store_id = ? AND created_at >= ?",
    )
    .bind(store_id)
    .bind(since_millis)
    .fetch_one(conn)
    .await?;
    Ok(count)
}

pub async fn insert_with_items(
    conn: &mut SqliteConnection,
    order: &NewPosOrder,
) -> RepoResult<i64> {
    let id = snowflake_id();
    let now = now_millis();

    sqlx::query(
        "INSERT INTO pos_order (id, store_id, order_number, token_number, order_type, status, payment_status, customer_name, customer_phone, customer_address, source_platform, external_order_id, subtotal, tax, discount, total, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 'confirmed', 'pending', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(order.store_id)
    .bind(&order.order_number)
    .bind(order.token_number)
    .bind(order.order_type)
    .bind(&order.customer_name)
    .bind(&order.customer_phone)
    .bind(&order.customer_address)
    .bind(order.source_platform)
    .bind(&order.external_order_id)
    .bind(order.subtotal)
    .bind(order.tax)
    .bind(order.discount)
    .bind(order.total)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    for item in &order.items {
        sqlx::query(
            "INSERT INTO pos_order_item (id, order_id, menu_item_id, name, price, quantity, status, variation_id, variation_name, variation_price, counter_id, item_total) VALUES (?, ?, ?, ?, ?, ?, 'pending', ?, ?, ?, ?, ?)",
        )
        .bind(snowflake_id())
        .bind(id)
        .bind(item.menu_item_id)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.quantity)
        .bind(item.variation_id)
        .bind(&item.variation_name)
        .bind(item.variation_price)
        .bind(item.counter_id)
        .bind(item.item_total)
        .execute(&mut *conn)
        .await?;
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{NewPosOrderItem, OrderType, Platform};
    use crate::db::repository::test_support::test_pool;

    fn ticket(store_id: i64, token: i64) -> NewPosOrder {
        NewPosOrder {
            store_id,
            order_number: format!("SWI-260115-{token}"),
            token_number: token,
            order_type: OrderType::DeliverySwiggy,
            customer_name: None,
            customer_phone: None,
            customer_address: None,
            source_platform: Some(Platform::Swiggy),
            external_order_id: Some(format!("EXT-{token}")),
            subtotal: 100.0,
            tax: 5.0,
            discount: 0.0,
            total: 105.0,
            items: vec![NewPosOrderItem {
                menu_item_id: 7,
                name: "Paneer Tikka".into(),
                price: 100.0,
                quantity: 1,
                variation_id: None,
                variation_name: None,
                variation_price: None,
                counter_id: Some(3),
                item_total: 100.0,
            }],
        }
    }

    #[tokio::test]
    async fn test_insert_and_count() {
        let pool = test_pool().await;

        let mut tx = pool.begin().await.unwrap();
        let before = count_since(&mut tx, 1, 0).await.unwrap();
        assert_eq!(before, 0);
        let id = insert_with_items(&mut tx, &ticket(1, before + 1)).await.unwrap();
        tx.commit().await.unwrap();

        let order = find_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(order.token_number, 1);
        assert_eq!(order.order_type, OrderType::DeliverySwiggy);
        assert_eq!(order.status, "confirmed");
        assert_eq!(order.payment_status, "pending");

        let items = find_items(&pool, id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].counter_id, Some(3));

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(count_since(&mut conn, 1, 0).await.unwrap(), 1);
        // Orders for other stores never count toward the token
        assert_eq!(count_since(&mut conn, 2, 0).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dine_in_tickets_count_toward_the_token() {
        let pool = test_pool().await;
        // Only delivery tickets originate here, but the POS writes dine-in
        // and takeaway rows into the same table and all of them advance
        // the token sequence.
        sqlx::query(
            "INSERT INTO pos_order (id, store_id, order_number, token_number, order_type, created_at, updated_at) VALUES (1, 1, 'DIN-1', 1, 'dine_in', 10, 10)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let order = find_by_id(&pool, 1).await.unwrap().unwrap();
        assert_eq!(order.order_type, OrderType::DineIn);

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(count_since(&mut conn, 1, 0).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_count_respects_boundary() {
        let pool = test_pool().await;
        let mut tx = pool.begin().await.unwrap();
        insert_with_items(&mut tx, &ticket(1, 1)).await.unwrap();
        tx.commit().await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let far_future = crate::utils::now_millis() + 86_400_000;
        assert_eq!(count_since(&mut conn, 1, far_future).await.unwrap(), 0);
    }
}
