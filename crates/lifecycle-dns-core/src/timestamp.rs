//! Fixed ISO-8601 rendering for time-like values in audit output
//!
//! Every timestamp leaves the crate as RFC 3339 with millisecond precision
//! and a `Z` suffix, e.g. `2024-05-01T12:00:00.000Z`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;

/// Render a timestamp in the fixed audit form
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `serialize_with` adapter for `DateTime<Utc>` fields
pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(ts))
}

/// `serialize_with` adapter for `Option<DateTime<Utc>>` fields
pub fn serialize_option<S>(ts: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match ts {
        Some(ts) => serializer.serialize_some(&format(ts)),
        None => serializer.serialize_none(),
    }
}
