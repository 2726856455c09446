//! Date formatting for query parameters

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp the way the API expects in query strings.
///
/// Whole seconds with a `Z` offset, e.g. `2024-01-31T17:45:00Z`.
#[must_use]
pub fn to_json_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}
