use chrono::{DateTime, Local, Utc};

/// Render a stored UTC timestamp in the server's local time zone
pub fn format_local(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
