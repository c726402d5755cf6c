// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::{
    answer_option::{AnswerOption, CreateAnswerOptionRequest, UpdateAnswerOptionRequest},
    attempt::{Attempt, AttemptSummary, CategoryResult, ResponseDetail},
    category::{Category, CreateCategoryRequest, UpdateCategoryRequest},
    question::{CreateQuestionRequest, Question, UpdateQuestionRequest},
    user::User,
};
use crate::scoring::CategoryScore;
use crate::store::{AttemptStore, CatalogStore, UserStore};

/// Production store over a Postgres pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Postgres signals a unique-index breach with SQLSTATE 23505.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Foreign-key breach (SQLSTATE 23503), e.g. deleting a referenced category.
fn is_fk_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}

const CATEGORY_COLS: &str =
    "id, name, description, result_text, characteristics, careers, color, slug, active, created_at, updated_at";
const QUESTION_COLS: &str =
    "id, text, category_id, question_type, display_order, required, active, created_at, updated_at";
const OPTION_COLS: &str =
    "id, label, value, position, description, active, created_at, updated_at";
const USER_COLS: &str = "id, name, email, password_hash, role, phone, created_at";
const ATTEMPT_COLS: &str =
    "id, user_id, display_name, display_email, concluded, authorized, total_score, dominant_category_id, created_at";

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        phone: Option<&str>,
        role: &str,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, phone, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLS}"
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(phone)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Email '{}' is already registered", email))
            } else {
                tracing::error!("Failed to create user: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLS} FROM categories WHERE active ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>, AppError> {
        Ok(sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_category(&self, req: &CreateCategoryRequest) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories (name, description, result_text, characteristics, careers, color)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {CATEGORY_COLS}"
        ))
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.result_text)
        .bind(&req.characteristics)
        .bind(&req.careers)
        .bind(&req.color)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("A category named '{}' already exists", req.name))
            } else {
                tracing::error!("Failed to create category: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn update_category(
        &self,
        id: i64,
        req: &UpdateCategoryRequest,
    ) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(&format!(
            "UPDATE categories
             SET name = $1, description = $2, result_text = $3, characteristics = $4,
                 careers = $5, color = $6, active = COALESCE($7, active), updated_at = now()
             WHERE id = $8
             RETURNING {CATEGORY_COLS}"
        ))
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.result_text)
        .bind(&req.characteristics)
        .bind(&req.careers)
        .bind(&req.color)
        .bind(req.active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("A category named '{}' already exists", req.name))
            } else {
                tracing::error!("Failed to update category: {:?}", e);
                AppError::from(e)
            }
        })?
        .ok_or(AppError::NotFound("Category not found".to_string()))
    }

    async fn delete_category(&self, id: i64) -> Result<(), AppError> {
        let (questions, results) = self.category_refs(id).await?;
        if questions > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete category: {} question(s) reference it",
                questions
            )));
        }
        if results > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete category: {} result(s) reference it",
                results
            )));
        }

        let deleted = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_fk_violation(&e) {
                    AppError::Conflict("Cannot delete category: still referenced".to_string())
                } else {
                    tracing::error!("Failed to delete category: {:?}", e);
                    AppError::from(e)
                }
            })?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("Category not found".to_string()));
        }
        Ok(())
    }

    async fn category_refs(&self, id: i64) -> Result<(i64, i64), AppError> {
        Ok(sqlx::query_as::<_, (i64, i64)>(
            "SELECT
                (SELECT COUNT(*) FROM questions WHERE category_id = $1),
                (SELECT COUNT(*) FROM results WHERE category_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_questions(&self, category_id: Option<i64>) -> Result<Vec<Question>, AppError> {
        Ok(sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLS} FROM questions
             WHERE active AND ($1::BIGINT IS NULL OR category_id = $1)
             ORDER BY category_id ASC, display_order ASC"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        Ok(sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLS} FROM questions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_question(&self, req: &CreateQuestionRequest) -> Result<Question, AppError> {
        // The owning category must exist before the insert is attempted, so
        // the caller gets a 400 instead of a raw FK failure.
        self.get_category(req.category_id)
            .await?
            .ok_or_else(|| AppError::Validation("Category not found".to_string()))?;

        Ok(sqlx::query_as::<_, Question>(&format!(
            "INSERT INTO questions (text, category_id, question_type, display_order, required)
             VALUES (
                $1, $2, $3,
                COALESCE($4, (SELECT COALESCE(MAX(display_order), 0) + 1
                              FROM questions WHERE category_id = $2)),
                $5
             )
             RETURNING {QUESTION_COLS}"
        ))
        .bind(&req.text)
        .bind(req.category_id)
        .bind(req.question_type.as_deref().unwrap_or("scale"))
        .bind(req.display_order)
        .bind(req.required.unwrap_or(true))
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_question(
        &self,
        id: i64,
        req: &UpdateQuestionRequest,
    ) -> Result<Question, AppError> {
        if req.text.is_none()
            && req.category_id.is_none()
            && req.question_type.is_none()
            && req.display_order.is_none()
            && req.required.is_none()
            && req.active.is_none()
        {
            return self
                .get_question(id)
                .await?
                .ok_or(AppError::NotFound("Question not found".to_string()));
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE questions SET ");
        let mut separated = builder.separated(", ");

        if let Some(text) = &req.text {
            separated.push("text = ");
            separated.push_bind_unseparated(text);
        }
        if let Some(category_id) = req.category_id {
            separated.push("category_id = ");
            separated.push_bind_unseparated(category_id);
        }
        if let Some(question_type) = &req.question_type {
            separated.push("question_type = ");
            separated.push_bind_unseparated(question_type);
        }
        if let Some(display_order) = req.display_order {
            separated.push("display_order = ");
            separated.push_bind_unseparated(display_order);
        }
        if let Some(required) = req.required {
            separated.push("required = ");
            separated.push_bind_unseparated(required);
        }
        if let Some(active) = req.active {
            separated.push("active = ");
            separated.push_bind_unseparated(active);
        }
        separated.push("updated_at = now()");

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {QUESTION_COLS}"));

        builder
            .build_query_as::<Question>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if is_fk_violation(&e) {
                    AppError::Validation("Category not found".to_string())
                } else {
                    tracing::error!("Failed to update question: {:?}", e);
                    AppError::from(e)
                }
            })?
            .ok_or(AppError::NotFound("Question not found".to_string()))
    }

    async fn disable_question(&self, id: i64) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE questions SET active = FALSE, updated_at = now() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Question not found".to_string()));
        }
        Ok(())
    }

    async fn list_answer_options(&self) -> Result<Vec<AnswerOption>, AppError> {
        Ok(sqlx::query_as::<_, AnswerOption>(&format!(
            "SELECT {OPTION_COLS} FROM answer_options WHERE active ORDER BY position ASC"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_answer_option(&self, id: i64) -> Result<Option<AnswerOption>, AppError> {
        Ok(sqlx::query_as::<_, AnswerOption>(&format!(
            "SELECT {OPTION_COLS} FROM answer_options WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_answer_option(
        &self,
        req: &CreateAnswerOptionRequest,
    ) -> Result<AnswerOption, AppError> {
        Ok(sqlx::query_as::<_, AnswerOption>(&format!(
            "INSERT INTO answer_options (label, value, position, description)
             VALUES (
                $1, $2,
                COALESCE($3, (SELECT COALESCE(MAX(position), 0) + 1 FROM answer_options)),
                $4
             )
             RETURNING {OPTION_COLS}"
        ))
        .bind(&req.label)
        .bind(req.value)
        .bind(req.position)
        .bind(&req.description)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_answer_option(
        &self,
        id: i64,
        req: &UpdateAnswerOptionRequest,
    ) -> Result<AnswerOption, AppError> {
        sqlx::query_as::<_, AnswerOption>(&format!(
            "UPDATE answer_options
             SET label = $1, value = $2, position = COALESCE($3, position),
                 description = $4, active = COALESCE($5, active), updated_at = now()
             WHERE id = $6
             RETURNING {OPTION_COLS}"
        ))
        .bind(&req.label)
        .bind(req.value)
        .bind(req.position)
        .bind(&req.description)
        .bind(req.active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Answer option not found".to_string()))
    }

    async fn disable_answer_option(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE answer_options SET active = FALSE, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Answer option not found".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AttemptStore for PgStore {
    async fn create_attempt(
        &self,
        user_id: Option<i64>,
        display_name: Option<&str>,
        display_email: Option<&str>,
    ) -> Result<Attempt, AppError> {
        Ok(sqlx::query_as::<_, Attempt>(&format!(
            "INSERT INTO attempts (user_id, display_name, display_email)
             VALUES ($1, $2, $3)
             RETURNING {ATTEMPT_COLS}"
        ))
        .bind(user_id)
        .bind(display_name)
        .bind(display_email)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn upsert_response(
        &self,
        attempt_id: i64,
        question_id: i64,
        option_id: i64,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO responses (attempt_id, question_id, option_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (attempt_id, question_id)
             DO UPDATE SET option_id = EXCLUDED.option_id",
        )
        .bind(attempt_id)
        .bind(question_id)
        .bind(option_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn response_details(&self, attempt_id: i64) -> Result<Vec<ResponseDetail>, AppError> {
        Ok(sqlx::query_as::<_, ResponseDetail>(
            "SELECT r.id, r.question_id, q.text AS question_text, q.category_id,
                    r.option_id, o.label AS option_label, o.value AS option_value
             FROM responses r
             JOIN questions q ON q.id = r.question_id
             JOIN answer_options o ON o.id = r.option_id
             WHERE r.attempt_id = $1
             ORDER BY q.category_id ASC, q.display_order ASC",
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn has_results(&self, attempt_id: i64) -> Result<bool, AppError> {
        Ok(
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM results WHERE attempt_id = $1)",
            )
            .bind(attempt_id)
            .fetch_one(&self.pool)
            .await?,
        )
    }

    async fn finalize_attempt(
        &self,
        attempt_id: i64,
        scores: &[CategoryScore],
        total_score: i64,
        dominant_category_id: Option<i64>,
    ) -> Result<(), AppError> {
        // All result rows and the attempt conclusion commit as one unit; a
        // failed transaction rolls back and leaves the attempt OPEN.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Integrity(format!("begin scoring transaction: {e}")))?;

        for score in scores {
            sqlx::query(
                "INSERT INTO results (attempt_id, category_id, score, percent)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(attempt_id)
            .bind(score.category_id)
            .bind(score.score)
            .bind(score.percent)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Attempt has already been scored".to_string())
                } else {
                    AppError::Integrity(format!("insert result row: {e}"))
                }
            })?;
        }

        sqlx::query(
            "UPDATE attempts
             SET concluded = TRUE, total_score = $2, dominant_category_id = $3
             WHERE id = $1",
        )
        .bind(attempt_id)
        .bind(total_score)
        .bind(dominant_category_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Integrity(format!("conclude attempt: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Integrity(format!("commit scoring transaction: {e}")))
    }

    async fn get_attempt(&self, id: i64) -> Result<Option<Attempt>, AppError> {
        Ok(sqlx::query_as::<_, Attempt>(&format!(
            "SELECT {ATTEMPT_COLS} FROM attempts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn set_authorized(&self, id: i64) -> Result<Attempt, AppError> {
        sqlx::query_as::<_, Attempt>(&format!(
            "UPDATE attempts SET authorized = TRUE WHERE id = $1 RETURNING {ATTEMPT_COLS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Attempt not found".to_string()))
    }

    async fn results_with_categories(
        &self,
        attempt_id: i64,
    ) -> Result<Vec<(CategoryResult, Category)>, AppError> {
        let results = sqlx::query_as::<_, CategoryResult>(
            "SELECT id, attempt_id, category_id, score, percent, approved, created_at
             FROM results
             WHERE attempt_id = $1
             ORDER BY percent DESC, category_id ASC",
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;

        let category_ids: Vec<i64> = results.iter().map(|r| r.category_id).collect();
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLS} FROM categories WHERE id = ANY($1)"
        ))
        .bind(&category_ids)
        .fetch_all(&self.pool)
        .await?;

        results
            .into_iter()
            .map(|result| {
                let category = categories
                    .iter()
                    .find(|c| c.id == result.category_id)
                    .cloned()
                    .ok_or_else(|| {
                        AppError::InternalServerError(format!(
                            "result {} references missing category {}",
                            result.id, result.category_id
                        ))
                    })?;
                Ok((result, category))
            })
            .collect()
    }

    async fn list_attempts(
        &self,
        user_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<AttemptSummary>, i64), AppError> {
        let attempts = sqlx::query_as::<_, AttemptSummary>(
            "SELECT a.id, a.user_id, u.name AS user_name, u.email AS user_email,
                    a.display_name, a.display_email, a.concluded, a.authorized,
                    a.total_score, a.dominant_category_id, a.created_at
             FROM attempts a
             LEFT JOIN users u ON u.id = a.user_id
             WHERE ($1::BIGINT IS NULL OR a.user_id = $1)
             ORDER BY a.created_at DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM attempts WHERE ($1::BIGINT IS NULL OR user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((attempts, total))
    }

    async fn has_completed(&self, user_id: i64) -> Result<bool, AppError> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM attempts WHERE user_id = $1 AND concluded)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn latest_authorized_attempt(&self, user_id: i64) -> Result<Option<Attempt>, AppError> {
        Ok(sqlx::query_as::<_, Attempt>(&format!(
            "SELECT {ATTEMPT_COLS} FROM attempts
             WHERE user_id = $1 AND concluded AND authorized
             ORDER BY created_at DESC
             LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
