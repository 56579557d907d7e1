//! Server State
//!
//! Shared handle passed to every request handler. Cloning is cheap, the
//! config sits behind an Arc and the pool is already a handle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sqlx::SqlitePool;

use crate::core::Config;
use crate::db::DbService;

#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    db: DbService,
}

impl ServerState {
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        let db = DbService::new(&config.database_path).await?;
        Ok(Self {
            config: Arc::new(config.clone()),
            db,
        })
    }

    /// State over an already-migrated pool, used by tests.
    pub fn from_pool(pool: SqlitePool, config: Config) -> Self {
        Self {
            config: Arc::new(config),
            db: DbService::from_pool(pool),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        self.db.pool()
    }

    /// Current instant in the configured business timezone.
    pub fn business_now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.config.timezone)
    }
}
