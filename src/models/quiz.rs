// src/models/quiz.rs

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    error::AppError,
    scoring::grader::{AnswerKey, QuestionKind},
    utils::html::clean_html,
};

/// Option keys are short labels such as "A" or "B2".
static OPTION_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{1,5}$").expect("option key pattern is valid"));

/// Quiz row joined with its subject name and question count, used for listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Minutes. 0 means untimed.
    pub time_limit: i64,
    pub difficulty: Option<String>,
    pub subject: Option<String>,
    pub question_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A teacher's own quiz with how often it was attempted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TeacherQuizSummary {
    pub id: i64,
    pub title: String,
    pub difficulty: Option<String>,
    pub subject: Option<String>,
    pub question_count: i64,
    pub attempt_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: i64,

    /// 'mc' or 'tf'.
    /// Mapped from the database column 'type' since `type` is a reserved keyword in Rust.
    #[sqlx(rename = "type")]
    pub question_type: String,

    pub text: String,
    pub correct_answer: String,
}

impl QuestionRow {
    pub fn answer_key(&self) -> Result<AnswerKey, AppError> {
        let kind = self
            .question_type
            .parse::<QuestionKind>()
            .map_err(|e| AppError::InternalServerError(format!("question {}: {}", self.id, e)))?;

        Ok(AnswerKey {
            question_id: self.id,
            kind,
            correct_answer: self.correct_answer.clone(),
        })
    }
}

/// Represents the 'options' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OptionRow {
    #[serde(skip)]
    pub question_id: i64,
    pub key: String,
    pub text: String,
}

/// DTO for sending a question to a student (excludes the answer key).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    #[serde(rename = "type")]
    pub question_type: QuestionKind,
    pub text: String,
    pub options: Vec<OptionRow>,
}

/// DTO for a quiz about to be taken.
#[derive(Debug, Serialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: QuizSummary,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewOption {
    #[validate(regex(path = *OPTION_KEY, message = "Option keys must be 1-5 letters or digits."))]
    pub key: String,
    #[validate(length(min = 1, max = 500))]
    pub text: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewQuestion {
    #[serde(rename = "type")]
    #[validate(required(message = "Question type is required."))]
    pub question_type: Option<String>,
    #[validate(
        required(message = "Question text is required."),
        length(min = 1, max = 1000)
    )]
    pub text: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 10))]
    pub correct: String,
    #[serde(default)]
    #[validate(nested)]
    pub options: Vec<NewOption>,
}

/// A question that passed every authoring rule, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoredQuestion {
    pub kind: QuestionKind,
    pub text: String,
    pub correct_answer: String,
    pub options: Vec<(String, String)>,
}

impl NewQuestion {
    /// Applies the rules field-level validation cannot express.
    ///
    /// Prompt and option texts are sanitised here, and a text that is blank
    /// once markup is stripped counts as missing. `index` is the zero-based
    /// position, used in error messages.
    pub fn into_authored(self, index: usize) -> Result<AuthoredQuestion, AppError> {
        let position = index + 1;

        let raw_type = self.question_type.unwrap_or_default();
        let kind = raw_type
            .parse::<QuestionKind>()
            .map_err(|e| AppError::BadRequest(format!("Question {}: {}", position, e)))?;

        let text = clean_html(self.text.as_deref().unwrap_or_default())
            .trim()
            .to_string();
        if text.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Question {}: text is required",
                position
            )));
        }

        match kind {
            QuestionKind::MultipleChoice => {
                let correct = self.correct.trim().to_string();
                let mut seen = HashSet::new();
                for opt in &self.options {
                    if !seen.insert(opt.key.as_str()) {
                        return Err(AppError::BadRequest(format!(
                            "Question {}: duplicate option key '{}'",
                            position, opt.key
                        )));
                    }
                }
                if !seen.contains(correct.as_str()) {
                    return Err(AppError::BadRequest(format!(
                        "Question {}: correct answer '{}' is not one of the option keys",
                        position, correct
                    )));
                }

                let mut options = Vec::with_capacity(self.options.len());
                for opt in self.options {
                    let option_text = clean_html(&opt.text).trim().to_string();
                    if option_text.is_empty() {
                        return Err(AppError::BadRequest(format!(
                            "Question {}: option '{}' has no text",
                            position, opt.key
                        )));
                    }
                    options.push((opt.key, option_text));
                }

                Ok(AuthoredQuestion {
                    kind,
                    text,
                    correct_answer: correct,
                    options,
                })
            }
            QuestionKind::TrueFalse => {
                let correct = match self.correct.trim().to_ascii_lowercase().as_str() {
                    "true" => "True",
                    "false" => "False",
                    _ => {
                        return Err(AppError::BadRequest(format!(
                            "Question {}: true/false answer must be True or False",
                            position
                        )));
                    }
                };

                Ok(AuthoredQuestion {
                    kind,
                    text,
                    correct_answer: correct.to_string(),
                    options: Vec::new(),
                })
            }
        }
    }
}

/// DTO for a teacher creating a quiz with all of its questions.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 120))]
    pub subject: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, max = 600))]
    pub time_limit: i64,
    #[validate(length(max = 50))]
    pub difficulty: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct QuizListParams {
    /// Filter by subject name.
    pub subject: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TeacherQuizParams {
    /// Case-insensitive title search.
    pub q: Option<String>,
}
