// src/handlers/subjects.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::subject::{CreateSubjectRequest, Subject},
    utils::html::{clean_html, clean_optional},
};

/// Lists all subjects alphabetically.
pub async fn list_subjects(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let subjects = sqlx::query_as::<_, Subject>(
        r#"
        SELECT id, name, code, description, category, grade_level
        FROM subjects
        ORDER BY name
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list subjects: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(subjects))
}

/// Creates a subject.
/// Teacher only. Name and code are unique.
pub async fn create_subject(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let name = clean_html(payload.name.trim());
    if name.is_empty() {
        return Err(AppError::BadRequest("Subject name is required".to_string()));
    }

    let subject = sqlx::query_as::<_, Subject>(
        r#"
        INSERT INTO subjects (name, code, description, category, grade_level)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING id, name, code, description, category, grade_level
        "#,
    )
    .bind(&name)
    .bind(clean_optional(payload.code.as_deref()))
    .bind(clean_optional(payload.description.as_deref()))
    .bind(clean_optional(payload.category.as_deref()))
    .bind(clean_optional(payload.grade_level.as_deref()))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Subject '{}' already exists", name))
        } else {
            tracing::error!("Failed to create subject: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(subject)))
}
