//! POS Order Models
//!
//! Rows in `pos_order` are what the kitchen and billing actually see. The
//! acceptance engine is the only writer for aggregator-sourced orders.

use serde::{Deserialize, Serialize};

use super::aggregator::Platform;

/// POS order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum OrderType {
    DineIn,
    Takeaway,
    DeliveryDirect,
    DeliverySwiggy,
    DeliveryZomato,
    DeliveryRapido,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::DineIn => "dine_in",
            OrderType::Takeaway => "takeaway",
            OrderType::DeliveryDirect => "delivery_direct",
            OrderType::DeliverySwiggy => "delivery_swiggy",
            OrderType::DeliveryZomato => "delivery_zomato",
            OrderType::DeliveryRapido => "delivery_rapido",
        }
    }
}

/// POS order model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PosOrder {
    pub id: i64,
    pub store_id: i64,
    /// `<PLA>-<YYMMDD>-<external number>` for aggregator orders
    pub order_number: String,
    /// Kitchen token, resets at the business-day cutoff
    pub token_number: i64,
    pub order_type: OrderType,
    pub status: String,
    pub payment_status: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub source_platform: Option<Platform>,
    pub external_order_id: Option<String>,
    pub subtotal: f64,
    pub tax: f64,
    pub discount: f64,
    pub total: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// POS order line model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PosOrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub status: String,
    pub variation_id: Option<i64>,
    pub variation_name: Option<String>,
    pub variation_price: Option<f64>,
    pub counter_id: Option<i64>,
    pub item_total: f64,
}

/// Materialized POS order ready to insert
#[derive(Debug, Clone)]
pub struct NewPosOrder {
    pub store_id: i64,
    pub order_number: String,
    pub token_number: i64,
    pub order_type: OrderType,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub source_platform: Option<Platform>,
    pub external_order_id: Option<String>,
    pub subtotal: f64,
    pub tax: f64,
    pub discount: f64,
    pub total: f64,
    pub items: Vec<NewPosOrderItem>,
}

#[derive(Debug, Clone)]
pub struct NewPosOrderItem {
    pub menu_item_id: i64,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub variation_id: Option<i64>,
    pub variation_name: Option<String>,
    pub variation_price: Option<f64>,
    pub counter_id: Option<i64>,
    pub item_total: f64,
}
