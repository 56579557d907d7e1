//! Ingestion Pipeline
//!
//! Takes a normalized order from the webhook layer, deduplicates it,
//! resolves its lines against the catalog mappings and lands it in the
//! order ledger as `pending`. Acceptance is a separate, explicit step.

pub mod normalizer;
pub mod signature;

pub use normalizer::{IncomingLine, IncomingOrder, normalize};

use thiserror::Error;
use tracing::{info, warn};

use crate::db::models::{Aggregator, MappingStatus, NewAggregatorOrder, NewOrderLine};
use crate::db::repository::{RepoError, aggregator, aggregator_order, item_mapping};
use crate::utils::now_millis;
use sqlx::SqlitePool;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid payload: {0}")]
    BadPayload(String),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Result of ingesting one webhook delivery
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub order_id: i64,
    pub is_duplicate: bool,
}

/// Persist a normalized order. Runs check-and-insert inside one
/// transaction; the UNIQUE(aggregator_id, external_order_id) index
/// backstops the check, so at-least-once webhook delivery is safe.
pub async fn ingest(
    pool: &SqlitePool,
    aggregator: &Aggregator,
    incoming: IncomingOrder,
) -> Result<IngestOutcome, IngestError> {
    let mut tx = pool.begin().await.map_err(RepoError::from)?;

    if let Some(existing) =
        aggregator_order::find_by_external(&mut tx, aggregator.id, &incoming.external_order_id)
            .await?
    {
        info!(
            platform = %incoming.platform,
            external_order_id = %incoming.external_order_id,
            order_id = existing.id,
            "duplicate webhook delivery ignored"
        );
        return Ok(IngestOutcome {
            order_id: existing.id,
            is_duplicate: true,
        });
    }

    let mut lines = Vec::with_capacity(incoming.lines.len());
    let mut unmapped = 0usize;
    for line in &incoming.lines {
        let mapping =
            item_mapping::find_active_by_external(&mut tx, aggregator.id, &line.external_item_id)
                .await?;
        let (pos_item_id, pos_variation_id, mapping_status) = match mapping {
            Some(m) if m.pos_item_id.is_some() => {
                (m.pos_item_id, m.pos_variation_id, MappingStatus::Mapped)
            }
            _ => {
                unmapped += 1;
                (None, None, MappingStatus::Unmapped)
            }
        };
        lines.push(NewOrderLine {
            external_item_id: line.external_item_id.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            price: line.price,
            pos_item_id,
            pos_variation_id,
            mapping_status,
        });
    }

    let new_order = NewAggregatorOrder {
        store_id: aggregator.store_id,
        aggregator_id: aggregator.id,
        platform: incoming.platform,
        external_order_id: incoming.external_order_id.clone(),
        external_order_number: incoming.external_order_number,
        customer_name: incoming.customer_name,
        customer_phone: incoming.customer_phone,
        customer_address: incoming.customer_address,
        subtotal: incoming.subtotal,
        tax: incoming.tax,
        delivery_fee: incoming.delivery_fee,
        discount: incoming.discount,
        total: incoming.total,
        estimated_minutes: Some(incoming.estimated_minutes),
        raw_payload: Some(incoming.raw_payload),
        lines,
    };

    let order_id = match aggregator_order::insert_with_lines(&mut tx, &new_order).await {
        Ok(id) => id,
        Err(RepoError::Duplicate(_)) => {
            // Lost a race against a concurrent delivery of the same order.
            drop(tx);
            let mut conn = pool.acquire().await.map_err(RepoError::from)?;
            let existing = aggregator_order::find_by_external(
                &mut conn,
                aggregator.id,
                &incoming.external_order_id,
            )
            .await?
            .ok_or_else(|| RepoError::Database("duplicate order vanished".into()))?;
            return Ok(IngestOutcome {
                order_id: existing.id,
                is_duplicate: true,
            });
        }
        Err(e) => return Err(e.into()),
    };

    aggregator::touch_last_sync(&mut tx, aggregator.id, now_millis()).await?;
    tx.commit().await.map_err(RepoError::from)?;

    if unmapped > 0 {
        warn!(
            order_id,
            unmapped, "order ingested with unmapped lines, acceptance will be blocked"
        );
    }
    info!(
        order_id,
        platform = %incoming.platform,
        external_order_id = %incoming.external_order_id,
        lines = new_order.lines.len(),
        "aggregator order ingested"
    );

    Ok(IngestOutcome {
        order_id,
        is_duplicate: false,
    })
}
