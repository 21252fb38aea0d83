// src/handlers/teacher.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attempt::StudentSummaryRow,
        quiz::{AuthoredQuestion, CreateQuizRequest, TeacherQuizParams, TeacherQuizSummary},
    },
    scoring::round_to_tenth,
    utils::{
        export::{ExportParams, attachment, render_table},
        html::{clean_html, clean_optional},
        jwt::Claims,
    },
};

/// Finds a subject by name, creating it when it does not exist yet.
async fn resolve_subject(tx: &mut Transaction<'_, Sqlite>, name: &str) -> Result<i64, sqlx::Error> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM subjects WHERE name = ?1")
        .bind(name)
        .fetch_optional(&mut **tx)
        .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    tracing::info!("Creating subject '{}' on the fly", name);
    sqlx::query_scalar::<_, i64>("INSERT INTO subjects (name) VALUES (?1) RETURNING id")
        .bind(name)
        .fetch_one(&mut **tx)
        .await
}

async fn insert_question(
    tx: &mut Transaction<'_, Sqlite>,
    quiz_id: i64,
    position: usize,
    question: &AuthoredQuestion,
) -> Result<(), sqlx::Error> {
    let question_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO questions (quiz_id, position, type, text, correct_answer)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING id
        "#,
    )
    .bind(quiz_id)
    .bind(position as i64)
    .bind(question.kind.as_str())
    .bind(&question.text)
    .bind(&question.correct_answer)
    .fetch_one(&mut **tx)
    .await?;

    for (key, text) in &question.options {
        sqlx::query("INSERT INTO options (question_id, key, text) VALUES (?1, ?2, ?3)")
            .bind(question_id)
            .bind(key)
            .bind(text)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

/// Creates a quiz with all of its questions and options.
///
/// Every question is validated before anything is written; the inserts then
/// run in a single transaction.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let teacher_id = claims.account_id()?;

    let title = clean_html(payload.title.trim());
    if title.is_empty() {
        return Err(AppError::BadRequest("Quiz title is required".to_string()));
    }
    let subject = clean_optional(payload.subject.as_deref());
    let description = clean_optional(payload.description.as_deref());
    let difficulty = clean_optional(payload.difficulty.as_deref());

    let questions = payload
        .questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| q.into_authored(i))
        .collect::<Result<Vec<_>, AppError>>()?;

    let mut tx = pool.begin().await?;

    let subject_id = match subject.as_deref() {
        Some(name) => Some(resolve_subject(&mut tx, name).await?),
        None => None,
    };

    let quiz_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO quizzes (title, description, time_limit, difficulty, teacher_id, subject_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        RETURNING id
        "#,
    )
    .bind(&title)
    .bind(description)
    .bind(payload.time_limit)
    .bind(difficulty)
    .bind(teacher_id)
    .bind(subject_id)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    for (position, question) in questions.iter().enumerate() {
        insert_question(&mut tx, quiz_id, position, question).await?;
    }

    tx.commit().await?;

    tracing::info!(
        quiz_id,
        teacher_id,
        questions = questions.len(),
        "Quiz created"
    );

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": quiz_id }))))
}

/// Lists the calling teacher's quizzes, optionally filtered by title.
pub async fn list_my_quizzes(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<TeacherQuizParams>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = claims.account_id()?;
    let search = params
        .q
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let quizzes = sqlx::query_as::<_, TeacherQuizSummary>(
        r#"
        SELECT
            q.id,
            q.title,
            q.difficulty,
            s.name AS subject,
            (SELECT COUNT(*) FROM questions qu WHERE qu.quiz_id = q.id) AS question_count,
            (SELECT COUNT(*) FROM quiz_attempts a WHERE a.quiz_id = q.id) AS attempt_count,
            q.created_at
        FROM quizzes q
        LEFT JOIN subjects s ON s.id = q.subject_id
        WHERE q.teacher_id = ?1
          AND (?2 IS NULL OR instr(lower(q.title), ?2) > 0)
        ORDER BY q.created_at DESC, q.id DESC
        "#,
    )
    .bind(teacher_id)
    .bind(search)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list teacher quizzes: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(quizzes))
}

/// Deletes one of the calling teacher's quizzes.
/// Questions, options and attempts go with it.
pub async fn delete_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = claims.account_id()?;

    let result = sqlx::query("DELETE FROM quizzes WHERE id = ?1 AND teacher_id = ?2")
        .bind(quiz_id)
        .bind(teacher_id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    tracing::info!(quiz_id, teacher_id, "Quiz deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_student_summaries(pool: &SqlitePool) -> Result<Vec<StudentSummaryRow>, AppError> {
    let rows = sqlx::query_as::<_, StudentSummaryRow>(
        r#"
        SELECT
            s.id,
            s.name,
            s.email,
            COUNT(a.id) AS quizzes_taken,
            AVG(a.percent) AS avg_score
        FROM students s
        LEFT JOIN quiz_attempts a
            ON a.student_id = s.id AND a.completed_at IS NOT NULL
        GROUP BY s.id, s.name, s.email
        ORDER BY s.name, s.id
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to summarize students: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(rows
        .into_iter()
        .map(|row| StudentSummaryRow {
            avg_score: row.avg_score.map(round_to_tenth),
            ..row
        })
        .collect())
}

/// Class overview: quizzes taken and average score per student.
pub async fn list_students(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(fetch_student_summaries(&pool).await?))
}

/// Exports the class overview as CSV or TXT.
pub async fn export_students(
    State(pool): State<SqlitePool>,
    Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse, AppError> {
    let rows: Vec<Vec<String>> = fetch_student_summaries(&pool)
        .await?
        .into_iter()
        .map(|s| {
            vec![
                s.name,
                s.email,
                s.quizzes_taken.to_string(),
                s.avg_score.map(|v| format!("{:.1}", v)).unwrap_or_default(),
            ]
        })
        .collect();

    let body = render_table(
        params.format,
        &["Name", "Email", "Quizzes Taken", "Avg Score"],
        &rows,
    );

    Ok(attachment(params.format, "students", body))
}
