// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'attempts' table: one run of the intelligence test.
///
/// State machine: OPEN (no results) -> SCORED (concluded=true, results
/// written) -> AUTHORIZED. Transitions are one-directional.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,

    /// Owning user; None for anonymous attempts.
    pub user_id: Option<i64>,

    /// Name/email snapshot taken at submission time.
    pub display_name: Option<String>,
    pub display_email: Option<String>,

    pub concluded: bool,

    /// One-way latch flipped by a privileged actor; gates result visibility.
    pub authorized: bool,

    pub total_score: i64,

    pub dominant_category_id: Option<i64>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'responses' table: the chosen option for one question.
/// At most one row per (attempt, question); re-submission is last-write-wins.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Response {
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,
    pub option_id: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A response joined with its question and option, as the scoring engine and
/// the projector consume it. Option values come from the catalog row, never
/// from the client.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResponseDetail {
    pub id: i64,
    pub question_id: i64,
    pub question_text: String,
    pub category_id: i64,
    pub option_id: i64,
    pub option_label: String,
    pub option_value: i64,
}

/// Represents the 'results' table: one scored category of an attempt.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CategoryResult {
    pub id: i64,
    pub attempt_id: i64,
    pub category_id: i64,
    /// Sum of chosen option values over this category's answered questions.
    pub score: i64,
    /// 0..100, two-decimal rounding, normalized over the answered subset.
    pub percent: f64,
    pub approved: Option<bool>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// An attempt row joined with the owning user, for admin listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttemptSummary {
    pub id: i64,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub display_name: Option<String>,
    pub display_email: Option<String>,
    pub concluded: bool,
    pub authorized: bool,
    pub total_score: i64,
    pub dominant_category_id: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// One (question, option) pair of a submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResponsePair {
    pub question_id: i64,
    pub option_id: i64,
}

/// DTO for submitting a complete test run.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    pub user_id: Option<i64>,
    #[validate(length(max = 200))]
    pub display_name: Option<String>,
    #[validate(length(max = 200))]
    pub display_email: Option<String>,
    #[validate(length(min = 1, message = "At least one response is required."))]
    pub responses: Vec<ResponsePair>,
}

/// What the caller gets back from a submission.
#[derive(Debug, Serialize)]
pub struct SubmitOutcome {
    pub attempt_id: i64,
    pub concluded: bool,
    pub authorized: bool,
}

/// Query parameters for listing attempts.
#[derive(Debug, Deserialize)]
pub struct ListAttemptsParams {
    pub user_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
