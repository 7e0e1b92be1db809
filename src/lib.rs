pub mod bridge;
pub mod config;
pub mod forms;
pub mod local_store;
pub mod navigation;
pub mod portal;
pub mod push;
pub mod search;
pub mod secrets;
pub mod session;
#[cfg(feature = "shell")]
mod shell;
pub mod status;
pub mod threads;
pub mod uploads;

#[cfg(feature = "shell")]
pub use shell::run;

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(value: &str, limit: usize) -> String {
    let trimmed = value.trim();
    if trimmed.chars().count() <= limit {
        return trimmed.to_string();
    }
    if limit <= 1 {
        return "…".to_string();
    }
    let mut truncated: String = trimmed.chars().take(limit - 1).collect();
    truncated.push('…');
    truncated
}

/// Shortens an error for the log, hiding it entirely when it mentions credentials.
pub(crate) fn redact_log_details(value: &str) -> String {
    const SENSITIVE_HINTS: [&str; 7] = [
        "token",
        "authorization",
        "bearer",
        "password",
        "site_key",
        "refresh",
        "set-cookie",
    ];

    let collapsed = collapse_whitespace(value);
    let lowered = collapsed.to_lowercase();
    if SENSITIVE_HINTS.iter().any(|hint| lowered.contains(hint)) {
        let category = collapsed
            .split(':')
            .next()
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .unwrap_or("error");
        return format!("{}: <redacted>", truncate_chars(category, 64));
    }

    truncate_chars(&collapsed, 180)
}
