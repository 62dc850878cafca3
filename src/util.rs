// util.rs
// Formatting and small helpers shared by the screens

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// "45 min", "2h", "1h 30min"
pub fn format_duration(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{} min", minutes);
    }

    let hours = minutes / 60;
    let remaining = minutes % 60;
    if remaining == 0 {
        format!("{}h", hours)
    } else {
        format!("{}h {}min", hours, remaining)
    }
}

/// Relative label for history rows, e.g. "3 min ago"
pub fn format_relative_time(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff_secs = (now - date).num_seconds();
    if diff_secs < 60 {
        return "Just now".to_string();
    }

    let minutes = diff_secs / 60;
    if minutes < 60 {
        return format!("{} min ago", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    let days = hours / 24;
    if days < 7 {
        return format!("{} days ago", days);
    }

    date.format("%Y-%m-%d").to_string()
}

/// Share of words spoken without a mistake, as a whole percentage
pub fn calculate_accuracy(mistakes: usize, total_words: usize) -> u32 {
    if total_words == 0 {
        return 100;
    }
    let correct = total_words.saturating_sub(mistakes) as f64;
    ((correct / total_words as f64) * 100.0).round() as u32
}

pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_RE
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
    re.is_match(email.trim())
}

pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
