//! Aggregator Order Models
//!
//! Incoming orders land here as an immutable ledger row plus one row per
//! line. The `status` column drives the lifecycle state machine; lines carry
//! their own mapping resolution so the review screen can show exactly which
//! lines still need attention.

use serde::{Deserialize, Serialize};

use super::aggregator::Platform;

/// Aggregator order lifecycle. `pending` is the only state with more than
/// one successor; `rejected` and `mapped_to_pos` are terminal, `failed`
/// can return to `pending` via retry. `accepted` is an acknowledgement
/// state reported by some platforms and is kept for wire compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    MappedToPos,
    Rejected,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::MappedToPos => "mapped_to_pos",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Failed => "failed",
        }
    }
}

/// Mapping resolution of a single order line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MappingStatus {
    Mapped,
    Unmapped,
    /// Resolved by an operator on the review screen
    Manual,
}

/// Aggregator order model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AggregatorOrder {
    pub id: i64,
    pub store_id: i64,
    pub aggregator_id: i64,
    pub platform: Platform,
    pub external_order_id: String,
    pub external_order_number: String,
    pub status: OrderStatus,
    pub pos_order_id: Option<i64>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub subtotal: f64,
    pub tax: f64,
    pub delivery_fee: f64,
    pub discount: f64,
    pub total: f64,
    pub estimated_minutes: Option<i64>,
    pub raw_payload: Option<String>,
    pub error_message: Option<String>,
    pub created_at: i64,
    pub accepted_at: Option<i64>,
}

/// Aggregator order line model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AggregatorOrderItem {
    pub id: i64,
    pub order_id: i64,
    pub item_index: i64,
    pub external_item_id: String,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
    pub pos_item_id: Option<i64>,
    pub pos_variation_id: Option<i64>,
    pub mapping_status: MappingStatus,
}

/// Order line joined with the POS item it resolved to, for the review screen.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EnrichedOrderItem {
    pub id: i64,
    pub order_id: i64,
    pub item_index: i64,
    pub external_item_id: String,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
    pub pos_item_id: Option<i64>,
    pub pos_variation_id: Option<i64>,
    pub mapping_status: MappingStatus,
    pub pos_item_name: Option<String>,
    pub pos_item_price: Option<f64>,
}

/// Order with its enriched lines
#[derive(Debug, Clone, Serialize)]
pub struct AggregatorOrderDetail {
    #[serde(flatten)]
    pub order: AggregatorOrder,
    pub items: Vec<EnrichedOrderItem>,
}

/// Normalized order ready to be persisted
#[derive(Debug, Clone)]
pub struct NewAggregatorOrder {
    pub store_id: i64,
    pub aggregator_id: i64,
    pub platform: Platform,
    pub external_order_id: String,
    pub external_order_number: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub subtotal: f64,
    pub tax: f64,
    pub delivery_fee: f64,
    pub discount: f64,
    pub total: f64,
    pub estimated_minutes: Option<i64>,
    pub raw_payload: Option<String>,
    pub lines: Vec<NewOrderLine>,
}

/// Normalized order line with its mapping resolution already applied
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub external_item_id: String,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
    pub pos_item_id: Option<i64>,
    pub pos_variation_id: Option<i64>,
    pub mapping_status: MappingStatus,
}
