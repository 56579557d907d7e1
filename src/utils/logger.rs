//! Logging Infrastructure
//!
//! Structured logging setup with support for both development and production
//! environments. Honors `RUST_LOG` via the env-filter; defaults to `info`.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger with optional file output.
///
/// When `log_dir` points at an existing directory, log lines are also
/// written to a daily-rotated file in that directory.
pub fn init_logger(log_level: Option<&str>, log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.unwrap_or("info")));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.exists() {
            let file_appender = tracing_appender::rolling::daily(dir, "dhaba-edge");
            subscriber.with_writer(file_appender).init();
            return;
        }
    }

    subscriber.init();
}
