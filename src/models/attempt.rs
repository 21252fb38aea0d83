// src/models/attempt.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::scoring::{
    format_elapsed,
    grader::{GradeOutcome, QuestionResult},
    progress::CompletedAttempt,
};

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitAttemptRequest {
    /// Key: question id as a string. Value: string, boolean or null.
    #[serde(default)]
    pub answers: HashMap<String, Value>,
    /// Browser timers report fractional seconds, so any JSON number is accepted.
    pub time_taken_seconds: Option<f64>,
}

impl SubmitAttemptRequest {
    /// Elapsed time as whole seconds, floored.
    ///
    /// Negative or non-finite values are dropped rather than failing the
    /// submission.
    pub fn elapsed_seconds(&self) -> Option<u64> {
        self.time_taken_seconds
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(|s| s.floor() as u64)
    }
}

/// Result of the take-quiz flow.
#[derive(Debug, Serialize)]
pub struct AttemptResponse {
    pub quiz_id: i64,
    pub total_questions: u32,
    pub correct: u32,
    pub percent: f64,
    pub details: Vec<QuestionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_taken_seconds: Option<u64>,
    /// `MM:SS`, present only with `time_taken_seconds`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_taken: Option<String>,
    /// `None` when the attempt could not be stored.
    pub attempt_id: Option<i64>,
    pub saved: bool,
}

impl AttemptResponse {
    pub fn new(quiz_id: i64, outcome: GradeOutcome, time_taken_seconds: Option<u64>, attempt_id: Option<i64>) -> Self {
        Self {
            quiz_id,
            total_questions: outcome.total_questions,
            correct: outcome.score,
            percent: outcome.percent,
            details: outcome.details,
            time_taken_seconds,
            time_taken: time_taken_seconds.map(format_elapsed),
            attempt_id,
            saved: attempt_id.is_some(),
        }
    }
}


/// A completed attempt joined with its quiz title and subject.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttemptHistoryRow {
    pub id: i64,
    pub quiz_id: i64,
    pub title: String,
    pub subject: Option<String>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub score: Option<i64>,
    pub percent: Option<f64>,
    pub time_taken_seconds: Option<i64>,
}

/// Minimal projection feeding the progress dashboard.
#[derive(Debug, Clone, FromRow)]
pub struct ProgressRow {
    pub percent: Option<f64>,
    pub subject: Option<String>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

impl From<ProgressRow> for CompletedAttempt {
    fn from(row: ProgressRow) -> Self {
        CompletedAttempt {
            percent: row.percent,
            subject: row.subject,
            completed_at: row.completed_at,
        }
    }
}

/// Per-student average used for the leaderboard.
#[derive(Debug, Clone, FromRow)]
pub struct StudentAverageRow {
    pub student_id: i64,
    pub name: String,
    pub average_percent: f64,
    pub quizzes_taken: i64,
}

/// Aggregated struct for displaying the leaderboard.
#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub student_id: i64,
    pub name: String,
    pub average_percent: f64,
    pub quizzes_taken: i64,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<i64>,
}

/// One row of the teacher's class overview.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudentSummaryRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub quizzes_taken: i64,
    pub avg_score: Option<f64>,
}
