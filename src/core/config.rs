//! Server Configuration
//!
//! All settings come from environment variables with sensible defaults:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | WORK_DIR | /var/lib/dhaba/edge | Working directory (database, logs) |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | DATABASE_PATH | <WORK_DIR>/dhaba.db | SQLite database file |
//! | TIMEZONE | Asia/Kolkata | Business timezone for ticket dating |
//! | BUSINESS_DAY_CUTOFF | 06:00 | Local time the kitchen token resets |
//! | ENVIRONMENT | development | development \| staging \| production |
//! | REQUIRE_WEBHOOK_SIGNATURES | true in production | Reject unsigned webhooks |
//! | LOG_LEVEL | info | Fallback when RUST_LOG is unset |

use chrono::NaiveTime;
use chrono_tz::Tz;
use tracing::warn;

use crate::utils::time::parse_cutoff;

#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and log files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// SQLite database file path
    pub database_path: String,
    /// Business timezone, drives order dating and the token boundary
    pub timezone: Tz,
    /// Local time at which the kitchen token sequence resets
    pub business_day_cutoff: NaiveTime,
    /// development | staging | production
    pub environment: String,
    /// When set, webhooks without a configured secret are rejected
    pub require_webhook_signatures: bool,
    /// Fallback log level when RUST_LOG is unset
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        let work_dir =
            std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/dhaba/edge".into());
        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| format!("{work_dir}/dhaba.db"));
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let timezone = std::env::var("TIMEZONE")
            .ok()
            .and_then(|tz| match tz.parse::<Tz>() {
                Ok(parsed) => Some(parsed),
                Err(_) => {
                    warn!(timezone = %tz, "unknown TIMEZONE, falling back to Asia/Kolkata");
                    None
                }
            })
            .unwrap_or(chrono_tz::Asia::Kolkata);

        let business_day_cutoff = parse_cutoff(
            &std::env::var("BUSINESS_DAY_CUTOFF").unwrap_or_else(|_| "06:00".into()),
        );

        let require_webhook_signatures = std::env::var("REQUIRE_WEBHOOK_SIGNATURES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(environment == "production");

        Self {
            work_dir,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_path,
            timezone,
            business_day_cutoff,
            environment,
            require_webhook_signatures,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        }
    }

    /// In-memory configuration for tests
    pub fn for_tests() -> Self {
        Self {
            work_dir: ".".into(),
            http_port: 0,
            database_path: ":memory:".into(),
            timezone: chrono_tz::Asia::Kolkata,
            business_day_cutoff: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            environment: "test".into(),
            require_webhook_signatures: false,
            log_level: "debug".into(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
