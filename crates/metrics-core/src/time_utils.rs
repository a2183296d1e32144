use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{MetricsError, Result};
use crate::models::DayTimestamp;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Resolve a `--timezone` value into a [`Tz`].
///
/// `"auto"` selects the system timezone, falling back to UTC with a warning
/// when the detected name is not a known IANA zone. An explicit name that
/// does not parse is a configuration error.
pub fn resolve_timezone(name: &str) -> Result<Tz> {
    if name.eq_ignore_ascii_case("auto") {
        let system = get_system_timezone();
        return Ok(system.parse::<Tz>().unwrap_or_else(|_| {
            warn!("unrecognised system timezone \"{}\", using UTC", system);
            Tz::UTC
        }));
    }
    name.parse::<Tz>()
        .map_err(|_| MetricsError::Config(format!("unknown timezone \"{}\"", name)))
}

// ── DateFormatter ─────────────────────────────────────────────────────────────

/// Renders day-timestamps as calendar dates in a fixed timezone.
#[derive(Debug, Clone, Copy)]
pub struct DateFormatter {
    tz: Tz,
}

impl DateFormatter {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Formatter pinned to UTC.
    pub fn utc() -> Self {
        Self::new(Tz::UTC)
    }

    /// Format a day-timestamp as `YYYY-MM-DD`.
    ///
    /// Timestamps outside chrono's representable range are rendered as the
    /// raw millisecond value.
    pub fn format_day(&self, day: DayTimestamp) -> String {
        match DateTime::<Utc>::from_timestamp_millis(day) {
            Some(dt) => dt.with_timezone(&self.tz).format("%Y-%m-%d").to_string(),
            None => format!("{}ms", day),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
