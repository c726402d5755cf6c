// src/handlers/categories.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::category::{CreateCategoryRequest, UpdateCategoryRequest},
    state::AppState,
    store::CatalogStore,
    utils::html::{clean_optional, clean_text},
};

/// Lists all active categories.
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = state.store.list_categories().await?;
    Ok(Json(categories))
}

/// Retrieves a single category by ID.
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let category = state
        .store
        .get_category(id)
        .await?
        .ok_or(AppError::NotFound("Category not found".to_string()))?;

    Ok(Json(category))
}

/// Creates a new intelligence category.
/// Admin only. Free-text fields are sanitized before storage.
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let payload = CreateCategoryRequest {
        name: clean_text(payload.name.trim()),
        description: clean_text(payload.description.trim()),
        result_text: clean_text(payload.result_text.trim()),
        characteristics: clean_optional(payload.characteristics),
        careers: clean_optional(payload.careers),
        color: payload.color.trim().to_string(),
    };

    let category = state.store.create_category(&payload).await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Updates a category. The full payload is required.
/// Admin only.
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let payload = UpdateCategoryRequest {
        name: clean_text(payload.name.trim()),
        description: clean_text(payload.description.trim()),
        result_text: clean_text(payload.result_text.trim()),
        characteristics: clean_optional(payload.characteristics),
        careers: clean_optional(payload.careers),
        color: payload.color.trim().to_string(),
        active: payload.active,
    };

    let category = state.store.update_category(id, &payload).await?;

    Ok(Json(category))
}

/// Hard-deletes a category.
/// Admin only. Refused with 409 while questions or results reference it.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.store.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
