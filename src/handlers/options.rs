// src/handlers/options.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::answer_option::{CreateAnswerOptionRequest, UpdateAnswerOptionRequest},
    state::AppState,
    store::CatalogStore,
    utils::html::{clean_optional, clean_text},
};

/// Lists the active answer scale, ordered by position.
pub async fn list_options(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let options = state.store.list_answer_options().await?;
    Ok(Json(options))
}

/// Retrieves a single answer option by ID.
pub async fn get_option(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let option = state
        .store
        .get_answer_option(id)
        .await?
        .ok_or(AppError::NotFound("Answer option not found".to_string()))?;

    Ok(Json(option))
}

/// Creates a new answer option; appended after the last scale position when
/// none is given.
/// Admin only.
pub async fn create_option(
    State(state): State<AppState>,
    Json(payload): Json<CreateAnswerOptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let payload = CreateAnswerOptionRequest {
        label: clean_text(payload.label.trim()),
        description: clean_optional(payload.description),
        ..payload
    };

    let option = state.store.create_answer_option(&payload).await?;

    Ok((StatusCode::CREATED, Json(option)))
}

/// Updates an answer option by ID.
/// Admin only.
pub async fn update_option(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAnswerOptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let payload = UpdateAnswerOptionRequest {
        label: clean_text(payload.label.trim()),
        description: clean_optional(payload.description),
        ..payload
    };

    let option = state.store.update_answer_option(id, &payload).await?;

    Ok(Json(option))
}

/// Soft-deletes an answer option (active=false).
/// Admin only.
pub async fn delete_option(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.store.disable_answer_option(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
