// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// The statement the respondent rates on the agreement scale.
    pub text: String,

    /// Owning intelligence category.
    pub category_id: i64,

    /// Question type tag. The current test only uses 'scale'.
    pub question_type: String,

    /// Position within the category. Auto-assigned when not given.
    pub display_order: i64,

    pub required: bool,

    /// Soft-delete flag; inactive questions stay for historical attempts.
    pub active: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000, message = "Question text is required."))]
    pub text: String,
    pub category_id: i64,
    #[validate(length(min = 1, max = 20))]
    pub question_type: Option<String>,
    pub display_order: Option<i64>,
    pub required: Option<bool>,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub text: Option<String>,
    pub category_id: Option<i64>,
    #[validate(length(min = 1, max = 20))]
    pub question_type: Option<String>,
    pub display_order: Option<i64>,
    pub required: Option<bool>,
    pub active: Option<bool>,
}
