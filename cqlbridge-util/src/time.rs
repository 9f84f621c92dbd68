use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Display format used for date columns: `yyyy-MM-dd HH:mm:ssZ` in UTC.
pub const DATE_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";

/// One accepted layout for textual temporal values.
#[derive(Debug, Clone, Copy)]
enum DateLayout {
    /// Date and time without an offset, read as UTC.
    Naive(&'static str),
    /// Date and time with a trailing `+HHMM` offset.
    Zoned(&'static str),
    /// Bare `yyyy-MM-dd`, midnight UTC.
    Date,
    /// `yyyy-MM-dd+HHMM`, midnight at the given offset.
    ZonedDate,
}

/// Accepted layouts, tried in order until one consumes the whole input.
const DATE_LAYOUTS: [DateLayout; 10] = [
    DateLayout::Naive("%Y-%m-%d %H:%M"),
    DateLayout::Naive("%Y-%m-%d %H:%M:%S"),
    DateLayout::Zoned("%Y-%m-%d %H:%M%z"),
    DateLayout::Zoned("%Y-%m-%d %H:%M:%S%z"),
    DateLayout::Naive("%Y-%m-%dT%H:%M"),
    DateLayout::Zoned("%Y-%m-%dT%H:%M%z"),
    DateLayout::Naive("%Y-%m-%dT%H:%M:%S"),
    DateLayout::Zoned("%Y-%m-%dT%H:%M:%S%z"),
    DateLayout::Date,
    DateLayout::ZonedDate,
];

/// Time utilities for working with timestamps
pub struct TimeUtils;

impl TimeUtils {
    /// Get timestamp in milliseconds since Unix epoch
    pub fn timestamp_millis() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Milliseconds since epoch as a UTC instant, `None` when out of range.
    pub fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(millis).single()
    }

    /// Render epoch milliseconds with [`DATE_DISPLAY_FORMAT`].
    pub fn format_millis(millis: i64) -> String {
        match Self::from_millis(millis) {
            Some(instant) => instant.format(DATE_DISPLAY_FORMAT).to_string(),
            None => millis.to_string(),
        }
    }

    /// Parse an ISO-8601 style date/time string into epoch milliseconds.
    ///
    /// Layouts are tried in a fixed order; the first one that consumes the
    /// entire input wins. Returns `None` when no layout matches.
    pub fn parse_iso8601_millis(text: &str) -> Option<i64> {
        DATE_LAYOUTS
            .iter()
            .find_map(|layout| Self::parse_with(*layout, text))
    }

    fn parse_with(layout: DateLayout, text: &str) -> Option<i64> {
        match layout {
            DateLayout::Naive(fmt) => NaiveDateTime::parse_from_str(text, fmt)
                .ok()
                .map(|naive| naive.and_utc().timestamp_millis()),
            DateLayout::Zoned(fmt) => DateTime::parse_from_str(text, fmt)
                .ok()
                .map(|dt| dt.timestamp_millis()),
            DateLayout::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc().timestamp_millis()),
            DateLayout::ZonedDate => {
                if text.len() <= 10 || !text.is_char_boundary(10) {
                    return None;
                }
                let (date, offset) = text.split_at(10);
                DateTime::parse_from_str(&format!("{date} 00:00{offset}"), "%Y-%m-%d %H:%M%z")
                    .ok()
                    .map(|dt| dt.timestamp_millis())
            }
        }
    }
}
