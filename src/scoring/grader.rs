// src/scoring/grader.rs

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::percent_of;

/// The two question formats a quiz can contain.
///
/// Stored as `mc` / `tf` in the `questions.type` column. The longer
/// `multiple-choice` / `true-false` spellings are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
}

impl QuestionKind {
    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "mc",
            QuestionKind::TrueFalse => "tf",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionKindError(pub String);

impl fmt::Display for QuestionKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown question type '{}'", self.0)
    }
}

impl std::error::Error for QuestionKindError {}

impl FromStr for QuestionKind {
    type Err = QuestionKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mc" | "multiple-choice" => Ok(QuestionKind::MultipleChoice),
            "tf" | "true-false" => Ok(QuestionKind::TrueFalse),
            _ => Err(QuestionKindError(s.to_string())),
        }
    }
}

/// The answer key for a single question.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerKey {
    pub question_id: i64,
    pub kind: QuestionKind,
    /// Option key for multiple-choice, `True` / `False` for true-false.
    pub correct_answer: String,
}

/// Grading result for one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    pub question_id: i64,
    /// The submitted value exactly as received (`null` when unanswered).
    pub given: Value,
    pub correct_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeOutcome {
    pub details: Vec<QuestionResult>,
    pub score: u32,
    pub total_questions: u32,
    /// `score / total * 100`, unrounded. Zero for an empty quiz.
    pub percent: f64,
}

/// String form of a submitted value, or `None` when nothing was submitted.
///
/// Booleans render as `True` / `False` so that a JSON `true` and the string
/// `"True"` are interchangeable.
pub fn answer_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn is_correct(key: &AnswerKey, given: &Value) -> bool {
    match key.kind {
        // Case-sensitive: "true" does not match "True".
        QuestionKind::TrueFalse => {
            answer_text(given).is_some_and(|text| text == key.correct_answer)
        }
        QuestionKind::MultipleChoice => {
            answer_text(given).is_some_and(|text| text.trim() == key.correct_answer.trim())
        }
    }
}

/// Grades a submission against a quiz's answer keys.
///
/// `answers` is keyed by question id in string form, matching the JSON
/// submission payload. Missing entries count as unanswered and are marked
/// incorrect. Answers for question ids outside `keys` are ignored.
pub fn grade(keys: &[AnswerKey], answers: &HashMap<String, Value>) -> GradeOutcome {
    let details: Vec<QuestionResult> = keys
        .iter()
        .map(|key| {
            let given = answers
                .get(&key.question_id.to_string())
                .cloned()
                .unwrap_or(Value::Null);
            let is_correct = is_correct(key, &given);

            QuestionResult {
                question_id: key.question_id,
                given,
                correct_answer: key.correct_answer.clone(),
                is_correct,
            }
        })
        .collect();

    let score = details.iter().filter(|d| d.is_correct).count() as u32;
    let total_questions = details.len() as u32;

    GradeOutcome {
        percent: percent_of(score, total_questions),
        details,
        score,
        total_questions,
    }
}
