// src/scoring/progress.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::{round_to_tenth, streak};
use crate::config::{DEFAULT_DAILY_GOAL, DEFAULT_WEEKLY_GOAL};

/// A finished attempt as seen by the progress dashboards.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedAttempt {
    pub percent: Option<f64>,
    pub subject: Option<String>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalWindow {
    Daily,
    Weekly,
}

impl GoalWindow {
    /// Trailing window measured back from "now".
    pub fn span(&self) -> Duration {
        match self {
            GoalWindow::Daily => Duration::hours(24),
            GoalWindow::Weekly => Duration::days(7),
        }
    }
}

/// A student's configured completion targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Goals {
    pub daily: i64,
    pub weekly: i64,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            daily: DEFAULT_DAILY_GOAL,
            weekly: DEFAULT_WEEKLY_GOAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub target: i64,
    pub completed: usize,
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectStrength {
    pub subject: String,
    pub average_percent: f64,
    pub attempts: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub daily_goal: GoalProgress,
    pub weekly_goal: GoalProgress,
    pub streak: u32,
    pub overall_average: Option<f64>,
    pub subject_strengths: Vec<SubjectStrength>,
    pub strongest_subject: Option<String>,
    pub weakest_subject: Option<String>,
    pub completed_attempts: usize,
}

/// `min(100, floor(completed / target * 100))`, or 0 for a non-positive target.
pub fn goal_percent(completed: usize, target: i64) -> u32 {
    if target <= 0 {
        return 0;
    }
    let raw = (completed as f64 / target as f64 * 100.0).floor();
    raw.min(100.0) as u32
}

/// Attempts completed within the trailing window ending at `now`.
pub fn completed_within(attempts: &[CompletedAttempt], now: DateTime<Utc>, window: GoalWindow) -> usize {
    let since = now - window.span();
    attempts
        .iter()
        .filter(|a| a.completed_at >= since && a.completed_at <= now)
        .count()
}

pub fn goal_progress(
    attempts: &[CompletedAttempt],
    now: DateTime<Utc>,
    window: GoalWindow,
    target: i64,
) -> GoalProgress {
    let completed = completed_within(attempts, now, window);
    GoalProgress {
        target,
        completed,
        percent: goal_percent(completed, target),
    }
}

/// Mean percent per subject, rounded to one decimal, best subject first.
///
/// Attempts without a subject or without a percent are skipped.
pub fn subject_strengths(attempts: &[CompletedAttempt]) -> Vec<SubjectStrength> {
    let mut totals: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

    for attempt in attempts {
        if let (Some(subject), Some(percent)) = (attempt.subject.as_deref(), attempt.percent) {
            let entry = totals.entry(subject).or_insert((0.0, 0));
            entry.0 += percent;
            entry.1 += 1;
        }
    }

    let mut strengths: Vec<SubjectStrength> = totals
        .into_iter()
        .map(|(subject, (sum, count))| SubjectStrength {
            subject: subject.to_string(),
            average_percent: round_to_tenth(sum / count as f64),
            attempts: count,
        })
        .collect();

    // Stable sort keeps alphabetical order among equal averages.
    strengths.sort_by(|a, b| b.average_percent.total_cmp(&a.average_percent));
    strengths
}

/// Mean percent over attempts that have one, rounded to one decimal.
pub fn overall_average(attempts: &[CompletedAttempt]) -> Option<f64> {
    let percents: Vec<f64> = attempts.iter().filter_map(|a| a.percent).collect();
    if percents.is_empty() {
        return None;
    }
    let sum: f64 = percents.iter().sum();
    Some(round_to_tenth(sum / percents.len() as f64))
}

/// Builds the full progress dashboard for one student.
pub fn summarize(attempts: &[CompletedAttempt], goals: Goals, now: DateTime<Utc>) -> ProgressSummary {
    let days = streak::completion_days(attempts.iter().map(|a| a.completed_at));
    let strengths = subject_strengths(attempts);

    ProgressSummary {
        daily_goal: goal_progress(attempts, now, GoalWindow::Daily, goals.daily),
        weekly_goal: goal_progress(attempts, now, GoalWindow::Weekly, goals.weekly),
        streak: streak::current_streak(&days, now.date_naive()),
        overall_average: overall_average(attempts),
        strongest_subject: strengths.first().map(|s| s.subject.clone()),
        weakest_subject: strengths.last().map(|s| s.subject.clone()),
        subject_strengths: strengths,
        completed_attempts: attempts.len(),
    }
}
