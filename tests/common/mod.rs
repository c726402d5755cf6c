// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use carreiras_backend::config::Config;
use carreiras_backend::error::AppError;
use carreiras_backend::models::{
    answer_option::{AnswerOption, CreateAnswerOptionRequest, UpdateAnswerOptionRequest},
    attempt::{Attempt, AttemptSummary, CategoryResult, Response, ResponseDetail},
    category::{Category, CreateCategoryRequest, UpdateCategoryRequest},
    question::{CreateQuestionRequest, Question, UpdateQuestionRequest},
    user::User,
};
use carreiras_backend::routes;
use carreiras_backend::scoring::CategoryScore;
use carreiras_backend::state::AppState;
use carreiras_backend::store::{AttemptStore, CatalogStore, UserStore};
use carreiras_backend::utils::jwt::sign_jwt;

pub const TEST_SECRET: &str = "test_secret_for_integration_tests";

/// In-memory implementation of the store ports. One mutex guards the whole
/// state, so finalize_attempt is atomic exactly like the Postgres
/// transaction it stands in for.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: Vec<User>,
    categories: Vec<Category>,
    questions: Vec<Question>,
    options: Vec<AnswerOption>,
    attempts: Vec<Attempt>,
    responses: Vec<Response>,
    results: Vec<CategoryResult>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        phone: Option<&str>,
        role: &str,
    ) -> Result<User, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(email))
        {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already registered",
                email
            )));
        }
        let user = User {
            id: inner.next_id(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role: role.to_string(),
            phone: phone.map(str::to_string),
            created_at: Some(Utc::now()),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut categories: Vec<Category> = inner
            .categories
            .iter()
            .filter(|c| c.active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn create_category(&self, req: &CreateCategoryRequest) -> Result<Category, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .categories
            .iter()
            .any(|c| c.name.to_lowercase() == req.name.to_lowercase())
        {
            return Err(AppError::Conflict(format!(
                "A category named '{}' already exists",
                req.name
            )));
        }
        let category = Category {
            id: inner.next_id(),
            name: req.name.clone(),
            description: req.description.clone(),
            result_text: req.result_text.clone(),
            characteristics: req.characteristics.clone(),
            careers: req.careers.clone(),
            color: req.color.clone(),
            slug: None,
            active: true,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        inner.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: i64,
        req: &UpdateCategoryRequest,
    ) -> Result<Category, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .categories
            .iter()
            .any(|c| c.id != id && c.name.to_lowercase() == req.name.to_lowercase())
        {
            return Err(AppError::Conflict(format!(
                "A category named '{}' already exists",
                req.name
            )));
        }
        let category = inner
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(AppError::NotFound("Category not found".to_string()))?;
        category.name = req.name.clone();
        category.description = req.description.clone();
        category.result_text = req.result_text.clone();
        category.characteristics = req.characteristics.clone();
        category.careers = req.careers.clone();
        category.color = req.color.clone();
        if let Some(active) = req.active {
            category.active = active;
        }
        category.updated_at = Some(Utc::now());
        Ok(category.clone())
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
        let mut inner = self.inner.lock().unwrap();
        let before = inner.categories.len();
        inner.categories.retain(|c| c.id != id);
        if inner.categories.len() == before {
            return Err(AppError::NotFound("Category not found".to_string()));
        }
        Ok(())
    }

    async fn category_refs(&self, id: i64) -> Result<(i64, i64), AppError> {
        let inner = self.inner.lock().unwrap();
        let questions = inner.questions.iter().filter(|q| q.category_id == id).count() as i64;
        let results = inner.results.iter().filter(|r| r.category_id == id).count() as i64;
        Ok((questions, results))
    }

    async fn list_questions(&self, category_id: Option<i64>) -> Result<Vec<Question>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut questions: Vec<Question> = inner
            .questions
            .iter()
            .filter(|q| q.active && category_id.is_none_or(|c| q.category_id == c))
            .cloned()
            .collect();
        questions.sort_by_key(|q| (q.category_id, q.display_order));
        Ok(questions)
    }

    async fn get_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn create_question(&self, req: &CreateQuestionRequest) -> Result<Question, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.categories.iter().any(|c| c.id == req.category_id) {
            return Err(AppError::Validation("Category not found".to_string()));
        }
        let display_order = req.display_order.unwrap_or_else(|| {
            inner
                .questions
                .iter()
                .filter(|q| q.category_id == req.category_id)
                .map(|q| q.display_order)
                .max()
                .unwrap_or(0)
                + 1
        });
        let question = Question {
            id: inner.next_id(),
            text: req.text.clone(),
            category_id: req.category_id,
            question_type: req.question_type.clone().unwrap_or_else(|| "scale".to_string()),
            display_order,
            required: req.required.unwrap_or(true),
            active: true,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        inner.questions.push(question.clone());
        Ok(question)
    }

    async fn update_question(
        &self,
        id: i64,
        req: &UpdateQuestionRequest,
    ) -> Result<Question, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(category_id) = req.category_id {
            if !inner.categories.iter().any(|c| c.id == category_id) {
                return Err(AppError::Validation("Category not found".to_string()));
            }
        }
        let question = inner
            .questions
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or(AppError::NotFound("Question not found".to_string()))?;
        if let Some(text) = &req.text {
            question.text = text.clone();
        }
        if let Some(category_id) = req.category_id {
            question.category_id = category_id;
        }
        if let Some(question_type) = &req.question_type {
            question.question_type = question_type.clone();
        }
        if let Some(display_order) = req.display_order {
            question.display_order = display_order;
        }
        if let Some(required) = req.required {
            question.required = required;
        }
        if let Some(active) = req.active {
            question.active = active;
        }
        question.updated_at = Some(Utc::now());
        Ok(question.clone())
    }

    async fn disable_question(&self, id: i64) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        let question = inner
            .questions
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or(AppError::NotFound("Question not found".to_string()))?;
        question.active = false;
        Ok(())
    }

    async fn list_answer_options(&self) -> Result<Vec<AnswerOption>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut options: Vec<AnswerOption> =
            inner.options.iter().filter(|o| o.active).cloned().collect();
        options.sort_by_key(|o| o.position);
        Ok(options)
    }

    async fn get_answer_option(&self, id: i64) -> Result<Option<AnswerOption>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.options.iter().find(|o| o.id == id).cloned())
    }

    async fn create_answer_option(
        &self,
        req: &CreateAnswerOptionRequest,
    ) -> Result<AnswerOption, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let position = req.position.unwrap_or_else(|| {
            inner.options.iter().map(|o| o.position).max().unwrap_or(0) + 1
        });
        let option = AnswerOption {
            id: inner.next_id(),
            label: req.label.clone(),
            value: req.value,
            position,
            description: req.description.clone(),
            active: true,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        inner.options.push(option.clone());
        Ok(option)
    }

    async fn update_answer_option(
        &self,
        id: i64,
        req: &UpdateAnswerOptionRequest,
    ) -> Result<AnswerOption, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let option = inner
            .options
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(AppError::NotFound("Answer option not found".to_string()))?;
        option.label = req.label.clone();
        option.value = req.value;
        if let Some(position) = req.position {
            option.position = position;
        }
        option.description = req.description.clone();
        if let Some(active) = req.active {
            option.active = active;
        }
        option.updated_at = Some(Utc::now());
        Ok(option.clone())
    }

    async fn disable_answer_option(&self, id: i64) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        let option = inner
            .options
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(AppError::NotFound("Answer option not found".to_string()))?;
        option.active = false;
        Ok(())
    }
}

#[async_trait]
impl AttemptStore for MemoryStore {
    async fn create_attempt(
        &self,
        user_id: Option<i64>,
        display_name: Option<&str>,
        display_email: Option<&str>,
    ) -> Result<Attempt, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let attempt = Attempt {
            id: inner.next_id(),
            user_id,
            display_name: display_name.map(str::to_string),
            display_email: display_email.map(str::to_string),
            concluded: false,
            authorized: false,
            total_score: 0,
            dominant_category_id: None,
            created_at: Some(Utc::now()),
        };
        inner.attempts.push(attempt.clone());
        Ok(attempt)
    }

    async fn upsert_response(
        &self,
        attempt_id: i64,
        question_id: i64,
        option_id: i64,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner
            .responses
            .iter_mut()
            .find(|r| r.attempt_id == attempt_id && r.question_id == question_id)
        {
            existing.option_id = option_id;
        } else {
            let response = Response {
                id: inner.next_id(),
                attempt_id,
                question_id,
                option_id,
                created_at: Some(Utc::now()),
            };
            inner.responses.push(response);
        }
        Ok(())
    }

    async fn response_details(&self, attempt_id: i64) -> Result<Vec<ResponseDetail>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut details = Vec::new();
        for response in inner.responses.iter().filter(|r| r.attempt_id == attempt_id) {
            let question = inner
                .questions
                .iter()
                .find(|q| q.id == response.question_id)
                .ok_or_else(|| {
                    AppError::InternalServerError("response references missing question".into())
                })?;
            let option = inner
                .options
                .iter()
                .find(|o| o.id == response.option_id)
                .ok_or_else(|| {
                    AppError::InternalServerError("response references missing option".into())
                })?;
            details.push(ResponseDetail {
                id: response.id,
                question_id: question.id,
                question_text: question.text.clone(),
                category_id: question.category_id,
                option_id: option.id,
                option_label: option.label.clone(),
                option_value: option.value,
            });
        }
        details.sort_by_key(|d| (d.category_id, d.question_id));
        Ok(details)
    }

    async fn has_results(&self, attempt_id: i64) -> Result<bool, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.results.iter().any(|r| r.attempt_id == attempt_id))
    }

    async fn finalize_attempt(
        &self,
        attempt_id: i64,
        scores: &[CategoryScore],
        total_score: i64,
        dominant_category_id: Option<i64>,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.results.iter().any(|r| r.attempt_id == attempt_id) {
            return Err(AppError::Conflict(
                "Attempt has already been scored".to_string(),
            ));
        }
        for score in scores {
            let result = CategoryResult {
                id: inner.next_id(),
                attempt_id,
                category_id: score.category_id,
                score: score.score,
                percent: score.percent,
                approved: None,
                created_at: Some(Utc::now()),
            };
            inner.results.push(result);
        }
        let attempt = inner
            .attempts
            .iter_mut()
            .find(|a| a.id == attempt_id)
            .ok_or(AppError::Integrity("attempt vanished mid-scoring".to_string()))?;
        attempt.concluded = true;
        attempt.total_score = total_score;
        attempt.dominant_category_id = dominant_category_id;
        Ok(())
    }

    async fn get_attempt(&self, id: i64) -> Result<Option<Attempt>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.attempts.iter().find(|a| a.id == id).cloned())
    }

    async fn set_authorized(&self, id: i64) -> Result<Attempt, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let attempt = inner
            .attempts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AppError::NotFound("Attempt not found".to_string()))?;
        attempt.authorized = true;
        Ok(attempt.clone())
    }

    async fn results_with_categories(
        &self,
        attempt_id: i64,
    ) -> Result<Vec<(CategoryResult, Category)>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut results: Vec<CategoryResult> = inner
            .results
            .iter()
            .filter(|r| r.attempt_id == attempt_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| {
            b.percent
                .partial_cmp(&a.percent)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.category_id.cmp(&b.category_id))
        });
        results
            .into_iter()
            .map(|result| {
                let category = inner
                    .categories
                    .iter()
                    .find(|c| c.id == result.category_id)
                    .cloned()
                    .ok_or_else(|| {
                        AppError::InternalServerError(
                            "result references missing category".to_string(),
                        )
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
        let inner = self.inner.lock().unwrap();
        let mut attempts: Vec<&Attempt> = inner
            .attempts
            .iter()
            .filter(|a| user_id.is_none_or(|u| a.user_id == Some(u)))
            .collect();
        attempts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = attempts.len() as i64;
        let summaries = attempts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|a| {
                let user = a.user_id.and_then(|id| inner.users.iter().find(|u| u.id == id));
                AttemptSummary {
                    id: a.id,
                    user_id: a.user_id,
                    user_name: user.map(|u| u.name.clone()),
                    user_email: user.map(|u| u.email.clone()),
                    display_name: a.display_name.clone(),
                    display_email: a.display_email.clone(),
                    concluded: a.concluded,
                    authorized: a.authorized,
                    total_score: a.total_score,
                    dominant_category_id: a.dominant_category_id,
                    created_at: a.created_at,
                }
            })
            .collect();
        Ok((summaries, total))
    }

    async fn has_completed(&self, user_id: i64) -> Result<bool, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .attempts
            .iter()
            .any(|a| a.user_id == Some(user_id) && a.concluded))
    }

    async fn latest_authorized_attempt(&self, user_id: i64) -> Result<Option<Attempt>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .attempts
            .iter()
            .filter(|a| a.user_id == Some(user_id) && a.concluded && a.authorized)
            .max_by_key(|a| (a.created_at, a.id))
            .cloned())
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiration: 600,
        port: 0,
        rust_log: "error".to_string(),
        admin_email: None,
        admin_password: None,
    }
}

/// Spawns the app on a random port over the given in-memory store.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
pub async fn spawn_app(store: Arc<MemoryStore>) -> String {
    let state = AppState {
        store,
        config: test_config(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

pub fn admin_token() -> String {
    sign_jwt(1, "admin", TEST_SECRET, 600).unwrap()
}

pub fn user_token(user_id: i64) -> String {
    sign_jwt(user_id, "user", TEST_SECRET, 600).unwrap()
}

/// Seeds two categories, three questions each, and the default 1..5 scale.
/// Returns (category_ids, question_ids ordered by category, option ids by value 1..=5).
pub async fn seed_catalog(store: &MemoryStore) -> (Vec<i64>, Vec<i64>, Vec<i64>) {
    let mut category_ids = Vec::new();
    for name in ["Lógica", "Musical"] {
        let category = store
            .create_category(&CreateCategoryRequest {
                name: name.to_string(),
                description: format!("Inteligência {name}"),
                result_text: format!("Você tem o perfil {name}"),
                characteristics: None,
                careers: None,
                color: "#1e88e5".to_string(),
            })
            .await
            .unwrap();
        category_ids.push(category.id);
    }

    let mut question_ids = Vec::new();
    for &category_id in &category_ids {
        for i in 1..=3 {
            let question = store
                .create_question(&CreateQuestionRequest {
                    text: format!("Afirmação {i} da categoria {category_id}"),
                    category_id,
                    question_type: None,
                    display_order: None,
                    required: None,
                })
                .await
                .unwrap();
            question_ids.push(question.id);
        }
    }

    let mut option_ids = Vec::new();
    for value in 1..=5 {
        let option = store
            .create_answer_option(&CreateAnswerOptionRequest {
                label: format!("Escala {value}"),
                value,
                position: None,
                description: None,
            })
            .await
            .unwrap();
        option_ids.push(option.id);
    }

    (category_ids, question_ids, option_ids)
}
