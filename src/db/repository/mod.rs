//! Repository Module
//!
//! Module functions over the shared SqlitePool. Functions that must
//! participate in a caller's transaction take `&mut SqliteConnection`
//! instead of the pool.

// Aggregator configuration
pub mod aggregator;

// Catalog mappings
pub mod category_mapping;
pub mod item_mapping;

// Order ledgers
pub mod aggregator_order;
pub mod pos_order;

// POS catalog reads
pub mod menu_item;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound(err.to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate(err.to_string())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
