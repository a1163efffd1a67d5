use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Saturates at `TimeDelta::MAX` instead of panicking on out-of-range values.
pub fn chrono_duration(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(TimeDelta::MAX)
}

/// Absolute expiry for a token granted at `now` with `expires_in_seconds` of validity.
/// `None` for a non-positive lifetime or one past the representable range.
pub fn expiry_after(now: DateTime<Utc>, expires_in_seconds: i64) -> Option<DateTime<Utc>> {
    if expires_in_seconds <= 0 {
        return None;
    }
    TimeDelta::try_seconds(expires_in_seconds).and_then(|lifetime| now.checked_add_signed(lifetime))
}

/// `1h 2m 3s`, `-5m 0s` once expired.
pub fn format_remaining(remaining: chrono::Duration) -> String {
    let total = remaining.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}{}h {}m {}s", sign, hours, minutes, seconds)
    } else {
        format!("{}{}m {}s", sign, minutes, seconds)
    }
}
