// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::{
    config::{LEADERBOARD_DEFAULT_LIMIT, LEADERBOARD_MAX_LIMIT},
    error::AppError,
    models::{
        attempt::{
            AttemptResponse, LeaderboardEntry, LeaderboardParams, StudentAverageRow,
            SubmitAttemptRequest,
        },
        quiz::{OptionRow, PublicQuestion, QuestionRow, QuizDetail, QuizListParams, QuizSummary},
    },
    scoring::{
        grader::{AnswerKey, GradeOutcome, answer_text, grade},
        ranking::dense_rank,
        round_to_tenth,
    },
    utils::{html::clean_html, jwt::Claims},
};

const QUIZ_SUMMARY_SELECT: &str = r#"
    SELECT
        q.id,
        q.title,
        q.description,
        q.time_limit,
        q.difficulty,
        s.name AS subject,
        (SELECT COUNT(*) FROM questions qu WHERE qu.quiz_id = q.id) AS question_count,
        q.created_at
    FROM quizzes q
    LEFT JOIN subjects s ON s.id = q.subject_id
"#;

/// Lists quizzes, newest first, optionally filtered by subject name.
pub async fn list_quizzes(
    State(pool): State<SqlitePool>,
    Query(params): Query<QuizListParams>,
) -> Result<impl IntoResponse, AppError> {
    // Subject names are stored sanitised, so the filter is compared the same way.
    let subject = params
        .subject
        .as_deref()
        .map(|name| clean_html(name.trim()));
    let sql = format!(
        "{} WHERE (?1 IS NULL OR s.name = ?1) ORDER BY q.created_at DESC, q.id DESC",
        QUIZ_SUMMARY_SELECT
    );
    let quizzes = sqlx::query_as::<_, QuizSummary>(&sql)
        .bind(subject)
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list quizzes: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(quizzes))
}

async fn fetch_questions(pool: &SqlitePool, quiz_id: i64) -> Result<Vec<QuestionRow>, AppError> {
    let rows = sqlx::query_as::<_, QuestionRow>(
        r#"
        SELECT id, type, text, correct_answer
        FROM questions
        WHERE quiz_id = ?1
        ORDER BY position, id
        "#,
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a quiz with its questions and options, without answer keys.
pub async fn get_quiz(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let sql = format!("{} WHERE q.id = ?1", QUIZ_SUMMARY_SELECT);
    let quiz = sqlx::query_as::<_, QuizSummary>(&sql)
        .bind(quiz_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let questions = fetch_questions(&pool, quiz_id).await?;

    let options = sqlx::query_as::<_, OptionRow>(
        r#"
        SELECT o.question_id, o.key, o.text
        FROM options o
        JOIN questions qu ON qu.id = o.question_id
        WHERE qu.quiz_id = ?1
        ORDER BY o.id
        "#,
    )
    .bind(quiz_id)
    .fetch_all(&pool)
    .await?;

    let mut options_by_question: HashMap<i64, Vec<OptionRow>> = HashMap::new();
    for option in options {
        options_by_question
            .entry(option.question_id)
            .or_default()
            .push(option);
    }

    let questions = questions
        .into_iter()
        .map(|row| {
            let key = row.answer_key()?;
            Ok(PublicQuestion {
                id: row.id,
                question_type: key.kind,
                text: row.text,
                options: options_by_question.remove(&row.id).unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Json(QuizDetail { quiz, questions }))
}

/// Stores a graded attempt and its per-question answers in one transaction.
async fn persist_attempt(
    pool: &SqlitePool,
    quiz_id: i64,
    student_id: i64,
    outcome: &GradeOutcome,
    time_taken_seconds: Option<i64>,
    completed_at: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let started_at = time_taken_seconds
        .and_then(Duration::try_seconds)
        .and_then(|elapsed| completed_at.checked_sub_signed(elapsed))
        .unwrap_or(completed_at);

    let mut tx = pool.begin().await?;

    let attempt_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO quiz_attempts
            (quiz_id, student_id, started_at, completed_at, score, percent, time_taken_seconds)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        RETURNING id
        "#,
    )
    .bind(quiz_id)
    .bind(student_id)
    .bind(started_at)
    .bind(completed_at)
    .bind(outcome.score as i64)
    .bind(outcome.percent)
    .bind(time_taken_seconds)
    .fetch_one(&mut *tx)
    .await?;

    for detail in &outcome.details {
        sqlx::query(
            r#"
            INSERT INTO attempt_answers (attempt_id, question_id, given_answer, is_correct)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(attempt_id)
        .bind(detail.question_id)
        .bind(answer_text(&detail.given))
        .bind(detail.is_correct)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(attempt_id)
}

/// Grades a student's submission and records the attempt.
///
/// * 404 if the quiz does not exist.
/// * Unanswered questions count as incorrect.
/// * If storing the attempt fails the graded result is still returned,
///   with `saved: false`.
pub async fn submit_attempt(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.account_id()?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM quizzes WHERE id = ?1")
        .bind(quiz_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let keys = fetch_questions(&pool, quiz_id)
        .await?
        .iter()
        .map(QuestionRow::answer_key)
        .collect::<Result<Vec<AnswerKey>, AppError>>()?;

    let outcome = grade(&keys, &req.answers);

    let elapsed = req.elapsed_seconds();
    let time_taken = elapsed.and_then(|s| i64::try_from(s).ok());
    let attempt_id = match persist_attempt(&pool, quiz_id, student_id, &outcome, time_taken, Utc::now()).await {
        Ok(id) => {
            tracing::info!(
                quiz_id,
                student_id,
                attempt_id = id,
                score = outcome.score,
                "Quiz attempt recorded"
            );
            Some(id)
        }
        Err(e) => {
            tracing::error!(quiz_id, student_id, "Failed to save quiz attempt: {:?}", e);
            None
        }
    };

    Ok(Json(AttemptResponse::new(
        quiz_id,
        outcome,
        elapsed,
        attempt_id,
    )))
}

/// Rounds each average to one decimal, orders by that rounded value (name
/// breaks ties) and assigns dense ranks.
fn rank_students(rows: Vec<StudentAverageRow>, limit: usize) -> Vec<LeaderboardEntry> {
    let mut rounded: Vec<(StudentAverageRow, f64)> = rows
        .into_iter()
        .map(|row| {
            let average = round_to_tenth(row.average_percent);
            (row, average)
        })
        .collect();
    rounded.sort_by(|(a, avg_a), (b, avg_b)| {
        avg_b
            .total_cmp(avg_a)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.student_id.cmp(&b.student_id))
    });

    dense_rank(rounded)
        .into_iter()
        .take(limit)
        .map(|entry| LeaderboardEntry {
            rank: entry.rank,
            student_id: entry.id.student_id,
            name: entry.id.name,
            average_percent: entry.average_percent,
            quizzes_taken: entry.id.quizzes_taken,
        })
        .collect()
}

/// Dense-ranked students by average completed-attempt percent.
///
/// Averages are rounded to one decimal before ranking, so 83.34 and 83.26
/// tie at 83.3.
pub async fn get_leaderboard(
    State(pool): State<SqlitePool>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params
        .limit
        .unwrap_or(LEADERBOARD_DEFAULT_LIMIT)
        .clamp(1, LEADERBOARD_MAX_LIMIT) as usize;

    let rows = sqlx::query_as::<_, StudentAverageRow>(
        r#"
        SELECT
            s.id AS student_id,
            s.name,
            AVG(a.percent) AS average_percent,
            COUNT(a.id) AS quizzes_taken
        FROM quiz_attempts a
        JOIN students s ON s.id = a.student_id
        WHERE a.completed_at IS NOT NULL AND a.percent IS NOT NULL
        GROUP BY s.id, s.name
        ORDER BY average_percent DESC, s.name ASC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let leaderboard = rank_students(rows, limit);

    Ok(Json(leaderboard))
}
