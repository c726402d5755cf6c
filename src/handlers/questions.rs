// src/handlers/questions.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{CreateQuestionRequest, UpdateQuestionRequest},
    state::AppState,
    store::CatalogStore,
    utils::html::clean_text,
};

/// Query parameters for listing questions.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category_id: Option<i64>,
}

/// Lists active questions, optionally filtered by category,
/// ordered by (category, display_order).
pub async fn list_questions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let questions = state.store.list_questions(params.category_id).await?;
    Ok(Json(questions))
}

/// Retrieves a single question by ID.
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = state
        .store
        .get_question(id)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    Ok(Json(question))
}

/// Creates a new question. display_order is appended within the category
/// when omitted.
/// Admin only.
pub async fn create_question(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let payload = CreateQuestionRequest {
        text: clean_text(payload.text.trim()),
        ..payload
    };

    let question = state.store.create_question(&payload).await?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Updates a question by ID. Fields are optional.
/// Admin only.
pub async fn update_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let payload = UpdateQuestionRequest {
        text: payload.text.map(|t| clean_text(t.trim())),
        ..payload
    };

    let question = state.store.update_question(id, &payload).await?;

    Ok(Json(question))
}

/// Soft-deletes a question (active=false), preserving historical attempts.
/// Admin only.
pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.store.disable_question(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
