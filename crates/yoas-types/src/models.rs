use chrono::{DateTime, Utc};

/// Human-readable creation time, as shown in API responses and dumps.
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Seconds since the Unix epoch, with sub-second precision.
pub fn unix_seconds(ts: &DateTime<Utc>) -> f64 {
    ts.timestamp() as f64 + f64::from(ts.timestamp_subsec_micros()) / 1_000_000.0
}

pub fn display_time(ts: &DateTime<Utc>) -> String {
    ts.format(DISPLAY_TIME_FORMAT).to_string()
}
