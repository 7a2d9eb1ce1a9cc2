use chrono::{DateTime, Local};
use indexmap::IndexMap;

/// One decoded form body: field name to field value, in encounter order.
pub type SubmissionRecord = IndexMap<String, String>;

/// Key format of the store document, microsecond precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Format a point in time as a store document key.
pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Store document key for "now".
///
/// Two submissions landing in the same microsecond share a key and the later
/// one replaces the earlier in the document.
pub fn timestamp_now() -> String {
    format_timestamp(Local::now())
}
