// src/models/answer_option.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'answer_options' table: one point of the agreement scale.
///
/// The maximum `value` across active options is the per-question ceiling the
/// scoring engine normalizes against. It is always read live from this table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: i64,

    /// Label shown to the respondent (e.g., "Concordo Totalmente").
    pub label: String,

    /// Numeric weight added to the category score when chosen.
    pub value: i64,

    /// Ordinal position on the scale, for display ordering.
    pub position: i64,

    pub description: Option<String>,

    pub active: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating an answer option.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAnswerOptionRequest {
    #[validate(length(min = 1, max = 200, message = "Label is required."))]
    pub label: String,
    pub value: i64,
    /// Appended after the current last position when omitted.
    pub position: Option<i64>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// DTO for updating an answer option.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAnswerOptionRequest {
    #[validate(length(min = 1, max = 200, message = "Label is required."))]
    pub label: String,
    pub value: i64,
    pub position: Option<i64>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub active: Option<bool>,
}
