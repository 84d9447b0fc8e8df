use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, TimeZone as _, Timelike, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{ReportError, Result};

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Resolve a configured timezone name into a [`Tz`].
///
/// `"auto"` selects the system timezone, falling back to UTC when the system
/// reports a name `chrono-tz` does not know. Any other unknown name is a
/// configuration error.
pub fn resolve_timezone(tz_name: &str) -> Result<Tz> {
    if tz_name.eq_ignore_ascii_case("auto") {
        let system = get_system_timezone();
        return Ok(system.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "System timezone \"{}\" is not recognised, falling back to UTC",
                system
            );
            Tz::UTC
        }));
    }
    tz_name
        .parse::<Tz>()
        .map_err(|_| ReportError::Config(format!("unknown timezone \"{tz_name}\"")))
}

/// Convert fractional hours into a [`TimeDelta`], rounded to whole milliseconds.
pub fn hours_to_delta(hours: f64) -> TimeDelta {
    TimeDelta::milliseconds((hours * 3_600_000.0).round() as i64)
}

/// Convert a [`TimeDelta`] into fractional hours.
pub fn delta_to_hours(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 3_600_000.0
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Handles timezone-aware timestamp parsing and local-time conversion.
#[derive(Debug, Clone, Copy)]
pub struct TimezoneHandler {
    tz: Tz,
}

impl TimezoneHandler {
    /// Naive layouts accepted in addition to RFC 3339.
    const NAIVE_FORMATS: &'static [&'static str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];

    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// The timezone naive timestamps are interpreted in.
    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Parse an ISO 8601 / RFC 3339 timestamp string into a UTC [`DateTime`].
    ///
    /// Strings carrying an offset (or `Z`) are converted directly. Naive
    /// strings are interpreted in the handler's timezone. An ambiguous local
    /// time (DST fall-back) resolves to the earlier instant. A non-existent
    /// local time (DST spring-forward) is rejected.
    pub fn parse_timestamp(&self, s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let normalised = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
            Some(stripped) => format!("{stripped}+00:00"),
            None => s.to_string(),
        };
        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.with_timezone(&Utc));
        }

        for fmt in Self::NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return self.from_local(&naive);
            }
        }

        None
    }

    /// Interpret a naive local date-time in the handler's timezone.
    pub fn from_local(&self, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
        self.tz
            .from_local_datetime(naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Local calendar date of a UTC instant.
    pub fn local_date(&self, dt: DateTime<Utc>) -> NaiveDate {
        dt.with_timezone(&self.tz).date_naive()
    }

    /// Local hour of day (0–23) of a UTC instant.
    pub fn local_hour(&self, dt: DateTime<Utc>) -> u32 {
        dt.with_timezone(&self.tz).hour()
    }

    /// Local wall-clock `(hour, minute)` of a UTC instant.
    pub fn local_clock(&self, dt: DateTime<Utc>) -> (u32, u32) {
        let local = dt.with_timezone(&self.tz);
        (local.hour(), local.minute())
    }
}
