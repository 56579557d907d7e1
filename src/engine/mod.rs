//! Order Engine
//!
//! The business side of the ledger: the lifecycle state machine, the
//! acceptance engine that materializes POS tickets, platform pricing and
//! name-based auto-mapping. The ingestion pipeline only creates `pending`
//! orders, everything after that goes through here.

pub mod acceptance;
pub mod auto_map;
pub mod lifecycle;
pub mod pricing;

pub use acceptance::{AcceptResult, accept_order};
pub use auto_map::{AutoMapResult, auto_map_by_name};

use thiserror::Error;

use crate::db::models::OrderStatus;
use crate::db::repository::RepoError;
use crate::utils::AppError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Order {0} not found")]
    OrderNotFound(i64),

    #[error("Cannot {action} an order in state {current:?}")]
    InvalidState {
        current: OrderStatus,
        action: &'static str,
    },

    #[error("Cannot accept order: {0} line(s) still unmapped")]
    MappingIncomplete(usize),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        EngineError::Repo(e.into())
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::OrderNotFound(_) => AppError::not_found(err.to_string()),
            EngineError::InvalidState { .. } => AppError::conflict(err.to_string()),
            EngineError::MappingIncomplete(_) => AppError::business_rule(err.to_string()),
            EngineError::Repo(repo) => repo.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
