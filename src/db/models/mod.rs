//! Database Models

// Aggregator domain
pub mod aggregator;
pub mod aggregator_order;
pub mod mapping;

// POS domain
pub mod menu;
pub mod pos_order;

// Re-exports
pub use aggregator::{
    Aggregator, AggregatorCreate, AggregatorCredentials, AggregatorStatus, AggregatorUpdate,
    Platform,
};
pub use aggregator_order::{
    AggregatorOrder, AggregatorOrderDetail, AggregatorOrderItem, EnrichedOrderItem, MappingStatus,
    NewAggregatorOrder, NewOrderLine, OrderStatus,
};
pub use mapping::{
    BulkCategoryEntry, BulkImportResult, BulkItemEntry, CategoryMapping, CategoryMappingCreate,
    CategoryMappingUpdate, ItemMapping, ItemMappingCreate, ItemMappingUpdate, ItemMappingWithPos,
    MappingType,
};
pub use menu::{ItemVariation, MenuItem};
pub use pos_order::{NewPosOrder, NewPosOrderItem, OrderType, PosOrder, PosOrderItem};
