//! Timestamp helpers shared by the seed data, mutations, and the
//! query engine's date handling.
//!
//! Records carry timestamps as ISO-8601 strings in the same shape a
//! browser's `Date.prototype.toISOString` produces
//! (`2024-05-01T09:00:00.000Z`).

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Current wall-clock instant in UTC.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Render an instant as a UTC ISO-8601 string with millisecond precision.
pub fn format_iso(dt: OffsetDateTime) -> String {
    let utc = dt.to_offset(UtcOffset::UTC);
    let format =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");
    utc.format(format)
        .unwrap_or_else(|_| utc.unix_timestamp().to_string())
}

/// Parse a timestamp string leniently.
///
/// Accepts RFC 3339 (with any offset), plus offset-less
/// `YYYY-MM-DDTHH:MM:SS[.fff]`, `YYYY-MM-DD HH:MM:SS` and bare
/// `YYYY-MM-DD`, which are read as UTC.
pub fn parse_instant(raw: &str) -> Option<OffsetDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(dt);
    }

    let naive_formats = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]"),
    ];
    for format in naive_formats {
        if let Ok(dt) = PrimitiveDateTime::parse(value, format) {
            return Some(dt.assume_utc());
        }
    }

    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}

/// Milliseconds since the Unix epoch, truncated.
pub fn epoch_millis(dt: OffsetDateTime) -> i128 {
    dt.unix_timestamp_nanos() / 1_000_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn format_iso_uses_millisecond_utc_shape() {
        let dt = datetime!(2024-05-01 09:00:00.123 +08:00);
        assert_eq!(format_iso(dt), "2024-05-01T01:00:00.123Z");
    }

    #[test]
    fn parse_instant_accepts_rfc3339_and_naive_forms() {
        let expected = datetime!(2024-05-01 09:00:00 UTC);
        assert_eq!(parse_instant("2024-05-01T09:00:00.000Z"), Some(expected));
        assert_eq!(parse_instant("2024-05-01T17:00:00+08:00"), Some(expected));
        assert_eq!(parse_instant("2024-05-01 09:00:00"), Some(expected));
        assert_eq!(parse_instant("2024-05-01T09:00:00"), Some(expected));
        assert_eq!(
            parse_instant("2024-05-01"),
            Some(datetime!(2024-05-01 00:00:00 UTC))
        );
    }

    #[test]
    fn parse_instant_rejects_free_text() {
        assert_eq!(parse_instant("活动策划会 3"), None);
        assert_eq!(parse_instant("user1@example.com"), None);
        assert_eq!(parse_instant("   "), None);
    }

    #[test]
    fn round_trips_through_iso_format() {
        let dt = datetime!(2023-12-31 23:59:59.999 UTC);
        assert_eq!(parse_instant(&format_iso(dt)), Some(dt));
        assert_eq!(epoch_millis(dt) % 1000, 999);
    }
}
