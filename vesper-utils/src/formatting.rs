/// Format seconds into a compact human-readable duration (e.g. 59s, 1m, 1h 30m).
pub fn format_compact_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        let mut parts = vec![format!("{}h", hours)];
        if minutes > 0 {
            parts.push(format!("{}m", minutes));
        }
        if seconds > 0 {
            parts.push(format!("{}s", seconds));
        }
        return parts.join(" ");
    }

    if minutes > 0 {
        return if seconds > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}m", minutes)
        };
    }

    format!("{}s", seconds)
}

/// Label a configured delay with its compact form, e.g. "90s (1m 30s)".
pub fn format_delay_setting(delay_seconds: u64) -> String {
    if delay_seconds < 60 {
        return format!("{}s", delay_seconds);
    }
    format!(
        "{}s ({})",
        delay_seconds,
        format_compact_duration(delay_seconds)
    )
}

/// Discord relative-timestamp markup for a unix time, e.g. "3 minutes ago".
pub fn relative_timestamp(unix_seconds: u64) -> String {
    format!("<t:{}:R>", unix_seconds)
}
