//! Dhaba Edge - aggregator order ingestion and POS reconciliation
//!
//! Receives webhook orders from delivery platforms (Swiggy, Zomato,
//! Rapido), deduplicates them, resolves each line against the store's
//! catalog mappings and, once an operator accepts, materializes a real
//! POS ticket with business-day token numbering and platform pricing.
//!
//! # Module structure
//!
//! ```text
//! src/
//! ├── core/      # Config, shared state, HTTP server lifecycle
//! ├── api/       # Axum routes and handlers
//! ├── ingest/    # Normalizer, signature check, dedup pipeline
//! ├── engine/    # Lifecycle state machine, acceptance, auto-map
//! ├── db/        # SQLite pool, models, repositories
//! └── utils/     # Errors, logging, time helpers, ids
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod engine;
pub mod ingest;
pub mod utils;

pub use core::{Config, Server, ServerState};
pub use utils::logger::init_logger;
pub use utils::{AppError, AppResult};

/// Startup banner
pub fn print_banner() {
    println!(
        r"
  ____  _           _           _____    _
 |  _ \| |__   __ _| |__   __ _| ____|__| | __ _  ___
 | | | | '_ \ / _` | '_ \ / _` |  _| / _` |/ _` |/ _ \
 | |_| | | | | (_| | |_) | (_| | |__| (_| | (_| |  __/
 |____/|_| |_|\__,_|_.__/ \__,_|_____\__,_|\__, |\___|
                                           |___/
 dhaba-edge v{}
",
        env!("CARGO_PKG_VERSION")
    );
}
