//! Business-day boundary math
//!
//! The POS groups orders into business days that start at a cutoff time
//! (06:00 by default) rather than midnight: an order placed at 05:30 still
//! belongs to yesterday's trading day. All conversions happen here in the
//! business timezone; the repository layer only ever sees `i64` Unix millis.

use chrono::{DateTime, Duration, NaiveTime, TimeZone};
use chrono_tz::Tz;

/// Parse a cutoff time string (HH:MM), falling back to 06:00.
pub fn parse_cutoff(cutoff: &str) -> NaiveTime {
    NaiveTime::parse_from_str(cutoff, "%H:%M").unwrap_or_else(|e| {
        tracing::warn!(
            "Failed to parse business_day_cutoff '{}': {}, falling back to 06:00",
            cutoff,
            e
        );
        NaiveTime::from_hms_opt(6, 0, 0).unwrap()
    })
}

/// Unix millis of the most recent business-day boundary at or before `now`.
///
/// If `now` is before today's cutoff, the boundary is yesterday's cutoff.
/// DST gap fallback: if the local boundary time does not exist, fall back
/// to interpreting it as UTC.
pub fn business_day_start_millis(now: DateTime<Tz>, cutoff: NaiveTime) -> i64 {
    let boundary_date = if now.time() < cutoff {
        (now - Duration::days(1)).date_naive()
    } else {
        now.date_naive()
    };
    let naive = boundary_date.and_time(cutoff);
    now.timezone()
        .from_local_datetime(&naive)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// Render `now` as the YYMMDD date prefix used in synthesized order numbers.
pub fn order_date_prefix(now: DateTime<Tz>) -> String {
    now.format("%y%m%d").to_string()
}
