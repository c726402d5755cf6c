// src/store/mod.rs

pub mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{
    answer_option::{AnswerOption, CreateAnswerOptionRequest, UpdateAnswerOptionRequest},
    attempt::{Attempt, AttemptSummary, CategoryResult, ResponseDetail},
    category::{Category, CreateCategoryRequest, UpdateCategoryRequest},
    question::{CreateQuestionRequest, Question, UpdateQuestionRequest},
    user::User,
};
use crate::scoring::CategoryScore;

pub use postgres::PgStore;

/// Identity persistence port.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates a user; duplicate email (case-insensitive) is a `Conflict`.
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        phone: Option<&str>,
        role: &str,
    ) -> Result<User, AppError>;

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn user_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
}

/// Catalog persistence port: categories, questions and the answer scale.
/// The scoring path only ever reads through this trait.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, AppError>;

    async fn get_category(&self, id: i64) -> Result<Option<Category>, AppError>;

    /// Duplicate name (case-insensitive) is a `Conflict`.
    async fn create_category(&self, req: &CreateCategoryRequest) -> Result<Category, AppError>;

    async fn update_category(
        &self,
        id: i64,
        req: &UpdateCategoryRequest,
    ) -> Result<Category, AppError>;

    /// Hard delete. Callers must check `category_refs` first; the store also
    /// refuses (Conflict) when questions or results still reference the row.
    async fn delete_category(&self, id: i64) -> Result<(), AppError>;

    /// (questions, results) referencing the category, soft-deleted included.
    async fn category_refs(&self, id: i64) -> Result<(i64, i64), AppError>;

    /// Active questions, ordered by (category, display_order).
    async fn list_questions(&self, category_id: Option<i64>) -> Result<Vec<Question>, AppError>;

    async fn get_question(&self, id: i64) -> Result<Option<Question>, AppError>;

    /// Assigns the next display_order within the category when none is given.
    async fn create_question(&self, req: &CreateQuestionRequest) -> Result<Question, AppError>;

    async fn update_question(
        &self,
        id: i64,
        req: &UpdateQuestionRequest,
    ) -> Result<Question, AppError>;

    /// Soft delete: flips active=false, preserving historical attempts.
    async fn disable_question(&self, id: i64) -> Result<(), AppError>;

    /// Active options, ordered by position.
    async fn list_answer_options(&self) -> Result<Vec<AnswerOption>, AppError>;

    async fn get_answer_option(&self, id: i64) -> Result<Option<AnswerOption>, AppError>;

    /// Appends after the last position when none is given.
    async fn create_answer_option(
        &self,
        req: &CreateAnswerOptionRequest,
    ) -> Result<AnswerOption, AppError>;

    async fn update_answer_option(
        &self,
        id: i64,
        req: &UpdateAnswerOptionRequest,
    ) -> Result<AnswerOption, AppError>;

    /// Soft delete.
    async fn disable_answer_option(&self, id: i64) -> Result<(), AppError>;
}

/// Attempt persistence port: attempts, responses and results.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    async fn create_attempt(
        &self,
        user_id: Option<i64>,
        display_name: Option<&str>,
        display_email: Option<&str>,
    ) -> Result<Attempt, AppError>;

    /// Records one response, last-write-wins per (attempt, question).
    async fn upsert_response(
        &self,
        attempt_id: i64,
        question_id: i64,
        option_id: i64,
    ) -> Result<(), AppError>;

    /// The attempt's responses joined with question and option catalog rows.
    async fn response_details(&self, attempt_id: i64) -> Result<Vec<ResponseDetail>, AppError>;

    async fn has_results(&self, attempt_id: i64) -> Result<bool, AppError>;

    /// Writes all result rows and marks the attempt concluded in a single
    /// transaction. A failure is an `Integrity` error and leaves the attempt
    /// untouched (OPEN, retryable).
    async fn finalize_attempt(
        &self,
        attempt_id: i64,
        scores: &[CategoryScore],
        total_score: i64,
        dominant_category_id: Option<i64>,
    ) -> Result<(), AppError>;

    async fn get_attempt(&self, id: i64) -> Result<Option<Attempt>, AppError>;

    /// Flips the authorization latch. State checks live in the engine.
    async fn set_authorized(&self, id: i64) -> Result<Attempt, AppError>;

    /// Result rows with their categories, ordered by percent descending.
    async fn results_with_categories(
        &self,
        attempt_id: i64,
    ) -> Result<Vec<(CategoryResult, Category)>, AppError>;

    async fn list_attempts(
        &self,
        user_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<AttemptSummary>, i64), AppError>;

    async fn has_completed(&self, user_id: i64) -> Result<bool, AppError>;

    /// The user's most recent concluded and authorized attempt, if any.
    async fn latest_authorized_attempt(&self, user_id: i64) -> Result<Option<Attempt>, AppError>;
}

/// Everything the application needs from persistence, as one object-safe
/// bundle so `AppState` can hold a single `Arc<dyn Store>`.
pub trait Store: UserStore + CatalogStore + AttemptStore {}

impl<T: UserStore + CatalogStore + AttemptStore> Store for T {}
