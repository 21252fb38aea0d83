// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// The two kinds of account. Each lives in its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Role::Student => "students",
            Role::Teacher => "teachers",
        }
    }
}

/// Columns shared by the 'students' and 'teachers' tables.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,
}

/// Public view of a freshly registered account.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// DTO for registering a student or teacher.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name length must be between 1 and 100 characters."
    ))]
    pub name: String,
    #[validate(email(message = "Email address is invalid."), length(max = 120))]
    pub email: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 120))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for a student updating their completion goals.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateGoalsRequest {
    #[validate(range(min = 0, max = 100))]
    pub daily_goal: i64,
    #[validate(range(min = 0, max = 100))]
    pub weekly_goal: i64,
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct GoalsRow {
    pub daily_goal: i64,
    pub weekly_goal: i64,
}
