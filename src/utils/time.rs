use chrono::Utc;

/// Wall-clock helpers for event timestamps.
pub struct Clock;

impl Clock {
    /// Milliseconds since the Unix epoch.
    pub fn millis() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Seconds since the Unix epoch.
    pub fn seconds() -> i64 {
        Utc::now().timestamp()
    }
}
