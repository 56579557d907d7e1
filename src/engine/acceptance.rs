//! Acceptance Engine
//!
//! Turns a fully mapped pending order into a real POS ticket in one
//! transaction: order number, kitchen token, platform pricing, counter
//! routing. Guard failures leave the order untouched; an unexpected
//! database failure during materialization parks it in `failed` so the
//! operator can retry.

use chrono::{DateTime, NaiveTime};
use chrono_tz::Tz;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use super::{EngineError, EngineResult, lifecycle::require_order, pricing};
use crate::db::models::{
    AggregatorOrder, AggregatorOrderItem, MappingStatus, NewPosOrder, NewPosOrderItem, OrderStatus,
};
use crate::db::repository::{
    aggregator_order, category_mapping, item_mapping, menu_item, pos_order,
};
use crate::utils::time::{business_day_start_millis, order_date_prefix};
use crate::utils::now_millis;

/// What acceptance hands back to the operator
#[derive(Debug, Clone, Serialize)]
pub struct AcceptResult {
    pub pos_order_id: i64,
    pub order_number: String,
    pub token_number: i64,
}

pub async fn accept_order(
    pool: &SqlitePool,
    order_id: i64,
    now: DateTime<Tz>,
    cutoff: NaiveTime,
) -> EngineResult<AcceptResult> {
    let order = require_order(pool, order_id).await?;
    if order.status != OrderStatus::Pending {
        return Err(EngineError::InvalidState {
            current: order.status,
            action: "accept",
        });
    }

    let items = aggregator_order::find_items(pool, order_id).await?;
    let unmapped = items
        .iter()
        .filter(|i| i.mapping_status == MappingStatus::Unmapped)
        .count();
    if unmapped > 0 {
        return Err(EngineError::MappingIncomplete(unmapped));
    }

    match materialize(pool, &order, &items, now, cutoff).await {
        Ok(result) => {
            info!(
                order_id,
                pos_order_id = result.pos_order_id,
                order_number = %result.order_number,
                token_number = result.token_number,
                "aggregator order accepted"
            );
            Ok(result)
        }
        Err(EngineError::Repo(e)) => {
            error!(order_id, error = %e, "acceptance failed, parking order as failed");
            // Compare-and-set: a concurrent transition that already moved
            // the order out of pending keeps its state.
            if !aggregator_order::mark_failed(pool, order_id, &e.to_string()).await? {
                warn!(order_id, "order already left pending, failure not recorded");
            }
            Err(EngineError::Repo(e))
        }
        Err(e) => Err(e),
    }
}

async fn materialize(
    pool: &SqlitePool,
    order: &AggregatorOrder,
    lines: &[AggregatorOrderItem],
    now: DateTime<Tz>,
    cutoff: NaiveTime,
) -> EngineResult<AcceptResult> {
    let mut tx = pool.begin().await?;

    let order_number = format!(
        "{}-{}-{}",
        order.platform.order_prefix(),
        order_date_prefix(now),
        order.external_order_number
    );

    // Read-then-insert: two concurrent acceptances for the same store can
    // draw the same token. Accepted in the source system and kept here.
    let boundary = business_day_start_millis(now, cutoff);
    let token_number = 1 + pos_order::count_since(&mut tx, order.store_id, boundary).await?;

    let mut pos_items = Vec::with_capacity(lines.len());
    for line in lines {
        let Some(menu_item_id) = line.pos_item_id else {
            warn!(
                order_id = order.id,
                item_index = line.item_index,
                name = %line.name,
                "line has no POS item, skipping"
            );
            continue;
        };
        let Some(item) = menu_item::find_by_id(&mut tx, menu_item_id).await? else {
            warn!(
                order_id = order.id,
                item_index = line.item_index,
                menu_item_id,
                "mapped POS item no longer exists, skipping line"
            );
            continue;
        };

        let platform_override =
            menu_item::platform_price(&mut tx, menu_item_id, order.platform).await?;
        let unit_price = pricing::resolve_unit_price(platform_override, item.price, line.price);

        let variation = match line.pos_variation_id {
            Some(vid) => menu_item::find_variation(&mut tx, vid).await?,
            None => None,
        };

        let mapping =
            item_mapping::find_active_by_external(&mut tx, order.aggregator_id, &line.external_item_id)
                .await?;
        let counter_id = match mapping.as_ref().and_then(|m| m.external_category.as_deref()) {
            Some(category) => {
                category_mapping::find_counter_for_category(&mut tx, order.aggregator_id, category)
                    .await?
            }
            None => None,
        };

        pos_items.push(NewPosOrderItem {
            menu_item_id,
            name: item.name,
            price: unit_price,
            quantity: line.quantity,
            variation_id: variation.as_ref().map(|v| v.id),
            variation_name: variation.as_ref().map(|v| v.name.clone()),
            variation_price: variation.as_ref().map(|v| v.price),
            counter_id,
            item_total: pricing::line_total(unit_price, line.quantity),
        });
    }

    let new_pos_order = NewPosOrder {
        store_id: order.store_id,
        order_number: order_number.clone(),
        token_number,
        order_type: order.platform.order_type(),
        customer_name: order.customer_name.clone(),
        customer_phone: order.customer_phone.clone(),
        customer_address: order.customer_address.clone(),
        source_platform: Some(order.platform),
        external_order_id: Some(order.external_order_id.clone()),
        subtotal: order.subtotal,
        tax: order.tax,
        discount: order.discount,
        total: order.total,
        items: pos_items,
    };

    let pos_order_id = pos_order::insert_with_items(&mut tx, &new_pos_order).await?;
    // The pending guard ran before this transaction opened, so the final
    // update re-checks it. A lost race rolls the whole ticket back.
    if !aggregator_order::mark_mapped_to_pos(&mut tx, order.id, pos_order_id, now_millis()).await? {
        let current = aggregator_order::status_of(&mut tx, order.id).await?;
        tx.rollback().await?;
        return Err(match current {
            Some(current) => EngineError::InvalidState {
                current,
                action: "accept",
            },
            None => EngineError::OrderNotFound(order.id),
        });
    }
    tx.commit().await?;

    Ok(AcceptResult {
        pos_order_id,
        order_number,
        token_number,
    })
}
