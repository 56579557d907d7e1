//! Order Lifecycle
//!
//! State machine over aggregator orders:
//! `pending -> mapped_to_pos | rejected | failed`, `failed -> pending`.
//! Every transition is guarded on the current state; acceptance itself
//! lives in `acceptance.rs`.

use sqlx::SqlitePool;
use tracing::info;

use super::{EngineError, EngineResult};
use crate::db::models::{AggregatorOrder, AggregatorOrderItem, OrderStatus};
use crate::db::repository::aggregator_order;

pub const DEFAULT_REJECT_REASON: &str = "Order rejected by user";

/// Reject a pending order with an operator-supplied reason. Mapping
/// completeness is not checked, any pending order can be rejected.
pub async fn reject_order(
    pool: &SqlitePool,
    order_id: i64,
    reason: Option<String>,
) -> EngineResult<AggregatorOrder> {
    let order = require_order(pool, order_id).await?;
    if order.status != OrderStatus::Pending {
        return Err(EngineError::InvalidState {
            current: order.status,
            action: "reject",
        });
    }

    let reason = reason
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REJECT_REASON.to_string());
    // A concurrent transition can land between the guard read and this
    // write, so the write re-checks the state.
    if !aggregator_order::mark_rejected(pool, order_id, &reason).await? {
        let order = require_order(pool, order_id).await?;
        return Err(EngineError::InvalidState {
            current: order.status,
            action: "reject",
        });
    }
    info!(order_id, %reason, "aggregator order rejected");
    require_order(pool, order_id).await
}

/// Put a failed order back into the pending queue, clearing the error.
pub async fn retry_order(pool: &SqlitePool, order_id: i64) -> EngineResult<AggregatorOrder> {
    let order = require_order(pool, order_id).await?;
    if order.status != OrderStatus::Failed {
        return Err(EngineError::InvalidState {
            current: order.status,
            action: "retry",
        });
    }

    if !aggregator_order::mark_pending(pool, order_id).await? {
        let order = require_order(pool, order_id).await?;
        return Err(EngineError::InvalidState {
            current: order.status,
            action: "retry",
        });
    }
    info!(order_id, "failed order returned to pending");
    require_order(pool, order_id).await
}

/// Operator resolution of a single line on the review screen. Only valid
/// while the order is still pending.
pub async fn remap_line(
    pool: &SqlitePool,
    order_id: i64,
    item_index: i64,
    pos_item_id: i64,
    pos_variation_id: Option<i64>,
) -> EngineResult<AggregatorOrderItem> {
    let order = require_order(pool, order_id).await?;
    if order.status != OrderStatus::Pending {
        return Err(EngineError::InvalidState {
            current: order.status,
            action: "remap a line of",
        });
    }

    let line = aggregator_order::update_line_mapping(
        pool,
        order_id,
        item_index,
        pos_item_id,
        pos_variation_id,
    )
    .await?;
    info!(order_id, item_index, pos_item_id, "order line manually remapped");
    Ok(line)
}

pub(super) async fn require_order(
    pool: &SqlitePool,
    order_id: i64,
) -> EngineResult<AggregatorOrder> {
    aggregator_order::find_by_id(pool, order_id)
        .await?
        .ok_or(EngineError::OrderNotFound(order_id))
}
