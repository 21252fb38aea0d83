// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::{Config, DEFAULT_DAILY_GOAL, DEFAULT_WEEKLY_GOAL},
    error::{AppError, is_unique_violation},
    models::user::{Account, AccountResponse, LoginRequest, RegisterRequest, Role},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

async fn register(
    pool: &SqlitePool,
    role: Role,
    payload: RegisterRequest,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    let hashed_password = hash_password(&payload.password)?;

    let inserted = match role {
        Role::Student => {
            sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO students (name, email, password, daily_goal, weekly_goal)
                VALUES (?1, ?2, ?3, ?4, ?5)
                RETURNING id
                "#,
            )
            .bind(payload.name.trim())
            .bind(&email)
            .bind(&hashed_password)
            .bind(DEFAULT_DAILY_GOAL)
            .bind(DEFAULT_WEEKLY_GOAL)
            .fetch_one(pool)
            .await
        }
        Role::Teacher => {
            sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO teachers (name, email, password)
                VALUES (?1, ?2, ?3)
                RETURNING id
                "#,
            )
            .bind(payload.name.trim())
            .bind(&email)
            .bind(&hashed_password)
            .fetch_one(pool)
            .await
        }
    };

    let id = inserted.map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Email '{}' is already registered", email))
        } else {
            tracing::error!("Failed to register {}: {:?}", role.as_str(), e);
            AppError::from(e)
        }
    })?;

    tracing::info!(account_id = id, role = role.as_str(), "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            id,
            name: payload.name.trim().to_string(),
            email,
            role,
        }),
    ))
}

async fn login(
    pool: &SqlitePool,
    config: &Config,
    role: Role,
    payload: LoginRequest,
) -> Result<Json<serde_json::Value>, AppError> {
    payload.validate()?;

    // Table names come from `Role::table`, never from user input.
    let sql = format!(
        "SELECT id, name, email, password FROM {} WHERE email = ?1",
        role.table()
    );
    let account = sqlx::query_as::<_, Account>(&sql)
        .bind(payload.email.trim().to_lowercase())
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Login DB error: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or(AppError::AuthError("Invalid email or password".to_string()))?;

    if !verify_password(&payload.password, &account.password)? {
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    let token = sign_jwt(account.id, role, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "role": role,
        "name": account.name,
    })))
}

/// Registers a new student with the default daily and weekly goals.
pub async fn register_student(
    State(pool): State<SqlitePool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    register(&pool, Role::Student, payload).await
}

/// Registers a new teacher.
pub async fn register_teacher(
    State(pool): State<SqlitePool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    register(&pool, Role::Teacher, payload).await
}

/// Authenticates a student and returns a bearer token.
pub async fn login_student(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    login(&pool, &config, Role::Student, payload).await
}

/// Authenticates a teacher and returns a bearer token.
pub async fn login_teacher(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    login(&pool, &config, Role::Teacher, payload).await
}
