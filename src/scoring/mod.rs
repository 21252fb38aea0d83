// src/scoring/mod.rs

//! Pure grading and statistics used by the quiz handlers.
//!
//! Nothing in here touches the database; callers fetch rows, hand them over,
//! and persist whatever comes back.

pub mod grader;
pub mod progress;
pub mod ranking;
pub mod streak;

/// `score / total * 100`, defined as 0 when `total` is 0.
pub fn percent_of(score: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    score as f64 / total as f64 * 100.0
}

/// Rounds to one decimal place (half away from zero).
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Formats elapsed seconds as zero-padded `MM:SS`.
///
/// Minutes are not wrapped into hours, so 3725 seconds is `62:05`.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
