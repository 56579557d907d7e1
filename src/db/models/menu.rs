//! POS catalog models read by the acceptance engine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MenuItem {
    pub id: i64,
    pub store_id: i64,
    pub name: String,
    pub price: f64,
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ItemVariation {
    pub id: i64,
    pub menu_item_id: i64,
    pub name: String,
    pub price: f64,
    pub is_active: bool,
}
