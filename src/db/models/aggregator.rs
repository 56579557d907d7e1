//! Aggregator Model
//!
//! One row per (store, platform) pair: the store's configured connection to
//! a delivery platform, holding the credential bundle and lifecycle status.

use serde::{Deserialize, Serialize};

use super::pos_order::OrderType;

/// Supported delivery platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Platform {
    Swiggy,
    Zomato,
    Rapido,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Swiggy, Platform::Zomato, Platform::Rapido];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Swiggy => "swiggy",
            Platform::Zomato => "zomato",
            Platform::Rapido => "rapido",
        }
    }

    /// Three-letter uppercase prefix used in synthesized order numbers.
    pub fn order_prefix(&self) -> &'static str {
        match self {
            Platform::Swiggy => "SWI",
            Platform::Zomato => "ZOM",
            Platform::Rapido => "RAP",
        }
    }

    /// POS order type for orders originating from this platform.
    pub fn order_type(&self) -> OrderType {
        match self {
            Platform::Swiggy => OrderType::DeliverySwiggy,
            Platform::Zomato => OrderType::DeliveryZomato,
            Platform::Rapido => OrderType::DeliveryRapido,
        }
    }

    /// Header carrying the webhook HMAC signature for this platform.
    pub fn signature_header(&self) -> &'static str {
        match self {
            Platform::Swiggy => "x-swiggy-signature",
            Platform::Zomato => "x-zomato-signature",
            Platform::Rapido => "x-rapido-signature",
        }
    }

    /// Webhook endpoint path for this platform.
    pub fn webhook_path(&self) -> &'static str {
        match self {
            Platform::Swiggy => "/webhook/swiggy",
            Platform::Zomato => "/webhook/zomato",
            Platform::Rapido => "/webhook/rapido",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregator connection lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AggregatorStatus {
    Active,
    Inactive,
    Error,
}

/// Aggregator model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Aggregator {
    pub id: i64,
    pub store_id: i64,
    pub platform: Platform,
    pub is_enabled: bool,
    /// Credential bundle, opaque to the engine
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Id of this store on the platform's side
    pub restaurant_id: Option<String>,
    pub webhook_secret: Option<String>,
    pub webhook_url: Option<String>,
    pub status: AggregatorStatus,
    pub last_sync_at: Option<i64>,
    pub created_at: i64,
}

/// Credential bundle accepted on create/update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregatorCredentials {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub restaurant_id: Option<String>,
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorCreate {
    pub store_id: i64,
    pub platform: Platform,
    #[serde(default)]
    pub credentials: Option<AggregatorCredentials>,
}

/// Partial update, only set fields are applied
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregatorUpdate {
    pub credentials: Option<AggregatorCredentials>,
    pub webhook_url: Option<String>,
    pub status: Option<AggregatorStatus>,
}
