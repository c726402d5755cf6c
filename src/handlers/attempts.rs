// src/handlers/attempts.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    engine,
    error::AppError,
    models::attempt::{ListAttemptsParams, SubmitAttemptRequest},
    state::AppState,
    utils::jwt::{Claims, resolve_viewer},
};

/// Submits a complete test run: records the responses and scores them
/// inline. Public; anonymous attempts are permitted.
pub async fn submit_attempt(
    State(state): State<AppState>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let outcome =
        engine::submit_attempt(state.store.as_ref(), state.store.as_ref(), &payload).await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

#[derive(Debug, Deserialize)]
pub struct GetAttemptParams {
    /// Escape hatch used by the coaching dashboard before login integration.
    pub force_admin: Option<bool>,
}

/// Retrieves an attempt, projected for the caller.
///
/// The bearer token is optional here: a valid admin token sees everything,
/// any other caller sees the restricted view until the attempt is authorized.
pub async fn get_attempt(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<GetAttemptParams>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let viewer = resolve_viewer(&headers, &state.config.jwt_secret);
    let force_admin = params.force_admin.unwrap_or(false);

    let projected = engine::get_attempt(state.store.as_ref(), id, viewer, force_admin).await?;

    Ok(Json(projected))
}

/// Lists attempts, newest first, optionally filtered by user.
/// Requires authentication.
pub async fn list_attempts(
    State(state): State<AppState>,
    Query(params): Query<ListAttemptsParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(50);
    let offset = params.offset.unwrap_or(0);

    let (attempts, total) =
        engine::list_attempts(state.store.as_ref(), params.user_id, limit, offset).await?;

    Ok(Json(serde_json::json!({
        "data": attempts,
        "meta": {
            "total": total,
            "limit": limit,
            "offset": offset,
        }
    })))
}

#[derive(Debug, Deserialize)]
pub struct CompletedParams {
    pub user_id: Option<i64>,
}

/// Whether a user already has a concluded attempt (the quiz wizard uses this
/// to skip straight to the waiting screen).
pub async fn has_completed(
    State(state): State<AppState>,
    Query(params): Query<CompletedParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = params
        .user_id
        .ok_or_else(|| AppError::Validation("user_id parameter is required".to_string()))?;

    let completed = engine::has_completed_attempt(state.store.as_ref(), user_id).await?;

    Ok(Json(serde_json::json!({ "completed": completed })))
}

/// Authorizes an attempt, releasing its results to the respondent.
/// Admin only; one-way, a second call is a 409.
pub async fn authorize_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = engine::authorize_attempt(state.store.as_ref(), id).await?;

    tracing::info!(attempt_id = id, actor = claims.user_id(), "result released");

    Ok(Json(attempt))
}

/// The caller's latest released result set, percent-descending.
/// Empty array when nothing has been released yet.
pub async fn my_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let results =
        engine::latest_authorized_results(state.store.as_ref(), claims.user_id()).await?;

    Ok(Json(results))
}
