//! Human-readable "time ago" labels for dashboard cards.

use chrono::{DateTime, Utc};

/// Formats the elapsed time between `then` and `now` as `"Just now"`,
/// `"N mins ago"`, `"N hours ago"` or `"N days ago"`.
///
/// Timestamps in the future (clock skew between sensor and server) are
/// reported as `"Just now"`.
#[must_use]
pub fn relative_label(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return plural(minutes, "min");
    }
    let hours = elapsed.num_hours();
    if hours < 24 {
        return plural(hours, "hour");
    }
    plural(elapsed.num_days(), "day")
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn buckets_by_magnitude() {
        let now = Utc::now();
        assert_eq!(relative_label(now, now), "Just now");
        assert_eq!(relative_label(now - Duration::seconds(59), now), "Just now");
        assert_eq!(relative_label(now - Duration::minutes(1), now), "1 min ago");
        assert_eq!(relative_label(now - Duration::minutes(45), now), "45 mins ago");
        assert_eq!(relative_label(now - Duration::minutes(61), now), "1 hour ago");
        assert_eq!(relative_label(now - Duration::hours(23), now), "23 hours ago");
        assert_eq!(relative_label(now - Duration::hours(49), now), "2 days ago");
    }

    #[test]
    fn future_timestamps_are_just_now() {
        let now = Utc::now();
        assert_eq!(relative_label(now + Duration::minutes(3), now), "Just now");
    }
}
