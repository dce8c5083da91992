use chrono::{DateTime, Utc};

/// Relative timestamp for activity feeds: "just now", "5 minutes ago", …
pub fn humanize_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(at);
    if diff.num_seconds() < 60 {
        return "just now".to_string();
    }
    if diff.num_hours() < 1 {
        let mins = diff.num_minutes();
        return format!("{mins} minute{} ago", plural(mins));
    }
    if diff.num_days() < 1 {
        let hours = diff.num_hours();
        return format!("{hours} hour{} ago", plural(hours));
    }
    let days = diff.num_days();
    format!("{days} day{} ago", plural(days))
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn buckets() {
        let now = Utc::now();
        assert_eq!(humanize_time(now - Duration::seconds(5), now), "just now");
        assert_eq!(
            humanize_time(now - Duration::minutes(1), now),
            "1 minute ago"
        );
        assert_eq!(
            humanize_time(now - Duration::minutes(12), now),
            "12 minutes ago"
        );
        assert_eq!(humanize_time(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(humanize_time(now - Duration::days(2), now), "2 days ago");
    }
}
