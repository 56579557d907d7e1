//! Catalog Mapping Models
//!
//! Item and category mappings translate a platform's catalog ids into the
//! POS catalog. Acceptance refuses orders whose lines lack an item mapping.

use serde::{Deserialize, Serialize};

use super::aggregator::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MappingType {
    Item,
    Variation,
}

/// Item mapping model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ItemMapping {
    pub id: i64,
    pub store_id: i64,
    pub aggregator_id: i64,
    pub platform: Platform,
    pub external_item_id: String,
    pub external_item_name: String,
    pub external_category: Option<String>,
    pub pos_item_id: Option<i64>,
    pub pos_variation_id: Option<i64>,
    pub mapping_type: MappingType,
    pub is_active: bool,
}

/// Item mapping joined with the POS item it points at, for listing screens.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ItemMappingWithPos {
    pub id: i64,
    pub store_id: i64,
    pub aggregator_id: i64,
    pub platform: Platform,
    pub external_item_id: String,
    pub external_item_name: String,
    pub external_category: Option<String>,
    pub pos_item_id: Option<i64>,
    pub pos_variation_id: Option<i64>,
    pub mapping_type: MappingType,
    pub is_active: bool,
    pub pos_item_name: Option<String>,
    pub pos_item_price: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemMappingCreate {
    pub store_id: i64,
    pub aggregator_id: i64,
    pub external_item_id: String,
    pub external_item_name: String,
    #[serde(default)]
    pub external_category: Option<String>,
    #[serde(default)]
    pub pos_item_id: Option<i64>,
    #[serde(default)]
    pub pos_variation_id: Option<i64>,
    #[serde(default)]
    pub mapping_type: Option<MappingType>,
}

/// Partial update, only set fields are applied
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemMappingUpdate {
    pub external_item_name: Option<String>,
    pub external_category: Option<String>,
    pub pos_item_id: Option<i64>,
    pub pos_variation_id: Option<i64>,
    pub mapping_type: Option<MappingType>,
    pub is_active: Option<bool>,
}

/// Category mapping model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryMapping {
    pub id: i64,
    pub store_id: i64,
    pub aggregator_id: i64,
    pub platform: Platform,
    pub external_category_id: String,
    pub external_category_name: String,
    pub counter_id: Option<i64>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryMappingCreate {
    pub store_id: i64,
    pub aggregator_id: i64,
    pub external_category_id: String,
    pub external_category_name: String,
    #[serde(default)]
    pub counter_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryMappingUpdate {
    pub external_category_name: Option<String>,
    pub counter_id: Option<i64>,
    pub is_active: Option<bool>,
}

/// One entry of a bulk item-mapping import
#[derive(Debug, Clone, Deserialize)]
pub struct BulkItemEntry {
    pub external_item_id: String,
    pub external_item_name: String,
    #[serde(default)]
    pub external_category: Option<String>,
    #[serde(default)]
    pub pos_item_id: Option<i64>,
    #[serde(default)]
    pub pos_variation_id: Option<i64>,
}

/// One entry of a bulk category-mapping import
#[derive(Debug, Clone, Deserialize)]
pub struct BulkCategoryEntry {
    pub external_category_id: String,
    pub external_category_name: String,
    #[serde(default)]
    pub counter_id: Option<i64>,
}

/// Outcome of a bulk import: entries whose external id already exists are
/// skipped rather than overwritten.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkImportResult {
    pub created: usize,
    pub skipped: usize,
}
