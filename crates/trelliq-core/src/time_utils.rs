use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Uses the `iana-time-zone` crate directly – no subprocess calls.
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Resolve a timezone setting (`"auto"` or an IANA name) to a [`Tz`].
///
/// Unknown names fall back to UTC with a warning.
pub fn resolve_timezone(name: &str) -> Tz {
    let name = if name.eq_ignore_ascii_case("auto") {
        get_system_timezone()
    } else {
        name.to_string()
    };
    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!("Unrecognised timezone \"{}\", falling back to UTC", name);
        Tz::UTC
    })
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Handles timezone-aware timestamp parsing and conversion.
pub struct TimezoneHandler {
    default_tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler that interprets offset-less timestamps in `tz`.
    pub fn new(tz: Tz) -> Self {
        Self { default_tz: tz }
    }

    /// Parse an ISO 8601 / RFC 3339 timestamp string into a UTC [`DateTime`].
    ///
    /// Handles the `Z`-suffix form Trello writes, any fixed UTC offset, and
    /// naive date-times (interpreted in the default timezone). Returns `None`
    /// for empty strings or unrecognised formats.
    pub fn parse_timestamp(&self, s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let normalised = if let Some(stripped) = s.strip_suffix('Z') {
            format!("{}+00:00", stripped)
        } else {
            s.to_string()
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.with_timezone(&Utc));
        }

        const FMTS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
        ];
        for fmt in FMTS {
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                return self.localize(naive);
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0).and_then(|naive| self.localize(naive));
        }

        warn!("TimezoneHandler: could not parse timestamp \"{}\"", s);
        None
    }

    /// Calendar date of `dt` in the default timezone.
    pub fn local_date(&self, dt: DateTime<Utc>) -> NaiveDate {
        dt.with_timezone(&self.default_tz).date_naive()
    }

    /// Expose the configured default timezone.
    pub fn default_tz(&self) -> Tz {
        self.default_tz
    }

    fn localize(&self, naive: chrono::NaiveDateTime) -> Option<DateTime<Utc>> {
        use chrono::TimeZone as _;
        self.default_tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

// ── Buckets ───────────────────────────────────────────────────────────────────

/// Day bucket key, `"%Y-%m-%d"`.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// ISO-week bucket key, e.g. `"2024-W51"`.
///
/// Uses the ISO week-numbering year, so 2024-12-30 belongs to `"2025-W01"`.
pub fn week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

// ── Trello object ids ─────────────────────────────────────────────────────────

/// Decode the creation time embedded in a Trello (MongoDB) object id.
///
/// The first 8 of the 24 hex digits are the creation time in Unix seconds.
/// Returns `None` for ids of any other shape.
pub fn timestamp_from_object_id(id: &str) -> Option<DateTime<Utc>> {
    if id.len() != 24 || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let secs = i64::from_str_radix(&id[..8], 16).ok()?;
    DateTime::from_timestamp(secs, 0)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
