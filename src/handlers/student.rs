// src/handlers/student.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attempt::{AttemptHistoryRow, ProgressRow},
        user::{GoalsRow, UpdateGoalsRequest},
    },
    scoring::{
        format_elapsed,
        progress::{CompletedAttempt, Goals, summarize},
        round_to_tenth,
    },
    utils::{
        export::{ExportParams, attachment, render_table},
        jwt::Claims,
    },
};

async fn fetch_goals(pool: &SqlitePool, student_id: i64) -> Result<Goals, AppError> {
    let row = sqlx::query_as::<_, GoalsRow>(
        "SELECT daily_goal, weekly_goal FROM students WHERE id = ?1",
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Student not found".to_string()))?;

    Ok(Goals {
        daily: row.daily_goal,
        weekly: row.weekly_goal,
    })
}

async fn fetch_history(pool: &SqlitePool, student_id: i64) -> Result<Vec<AttemptHistoryRow>, AppError> {
    let rows = sqlx::query_as::<_, AttemptHistoryRow>(
        r#"
        SELECT
            a.id,
            a.quiz_id,
            q.title,
            s.name AS subject,
            a.completed_at,
            a.score,
            a.percent,
            a.time_taken_seconds
        FROM quiz_attempts a
        JOIN quizzes q ON q.id = a.quiz_id
        LEFT JOIN subjects s ON s.id = q.subject_id
        WHERE a.student_id = ?1 AND a.completed_at IS NOT NULL
        ORDER BY a.completed_at DESC, a.id DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch attempt history: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(rows)
}

/// Goals, streak, averages and subject strengths for the calling student.
pub async fn get_progress(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.account_id()?;
    let goals = fetch_goals(&pool, student_id).await?;

    let attempts: Vec<CompletedAttempt> = sqlx::query_as::<_, ProgressRow>(
        r#"
        SELECT a.percent, s.name AS subject, a.completed_at
        FROM quiz_attempts a
        JOIN quizzes q ON q.id = a.quiz_id
        LEFT JOIN subjects s ON s.id = q.subject_id
        WHERE a.student_id = ?1 AND a.completed_at IS NOT NULL
        "#,
    )
    .bind(student_id)
    .fetch_all(&pool)
    .await?
    .into_iter()
    .map(CompletedAttempt::from)
    .collect();

    Ok(Json(summarize(&attempts, goals, Utc::now())))
}

/// Updates the calling student's daily and weekly goals.
pub async fn update_goals(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateGoalsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let student_id = claims.account_id()?;

    let result = sqlx::query("UPDATE students SET daily_goal = ?1, weekly_goal = ?2 WHERE id = ?3")
        .bind(payload.daily_goal)
        .bind(payload.weekly_goal)
        .bind(student_id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Student not found".to_string()));
    }

    Ok(Json(serde_json::json!({
        "daily_goal": payload.daily_goal,
        "weekly_goal": payload.weekly_goal,
    })))
}

/// Completed attempts of the calling student, newest first.
pub async fn list_attempts(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.account_id()?;
    Ok(Json(fetch_history(&pool, student_id).await?))
}

/// Exports the calling student's attempt history as CSV or TXT.
pub async fn export_attempts(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.account_id()?;

    let rows: Vec<Vec<String>> = fetch_history(&pool, student_id)
        .await?
        .into_iter()
        .map(|a| {
            vec![
                a.title,
                a.subject.unwrap_or_default(),
                a.completed_at.format("%Y-%m-%d %H:%M").to_string(),
                a.score.map(|s| s.to_string()).unwrap_or_default(),
                a.percent
                    .map(|p| format!("{:.1}", round_to_tenth(p)))
                    .unwrap_or_default(),
                a.time_taken_seconds
                    .and_then(|s| u64::try_from(s).ok())
                    .map(format_elapsed)
                    .unwrap_or_default(),
            ]
        })
        .collect();

    let body = render_table(
        params.format,
        &["Title", "Subject", "Completed At", "Score", "Percent", "Time"],
        &rows,
    );

    Ok(attachment(params.format, "attempts", body))
}
