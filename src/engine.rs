// src/engine.rs
//
// The test-taking core: records a submission, scores it, guards the
// authorization latch and projects stored results. Persistence and catalog
// access come in through the store ports so the whole flow runs identically
// against Postgres or an in-memory fake.

use std::collections::HashMap;

use crate::error::AppError;
use crate::models::attempt::{
    Attempt, AttemptSummary, ResponsePair, SubmitAttemptRequest, SubmitOutcome,
};
use crate::projection::{self, ProjectedAttempt, ProjectedResult, Viewer};
use crate::scoring::score_responses;
use crate::store::{AttemptStore, CatalogStore};

/// Records and scores a complete test submission.
///
/// Flow: validate the response pairs against the active catalog, create the
/// attempt, persist each response (idempotent per question), read the
/// responses back joined with their authoritative option values, score, and
/// finalize attempt + result rows in one transaction. The caller blocks
/// until scoring is done.
pub async fn submit_attempt<C, A>(
    catalog: &C,
    attempts: &A,
    req: &SubmitAttemptRequest,
) -> Result<SubmitOutcome, AppError>
where
    C: CatalogStore + ?Sized,
    A: AttemptStore + ?Sized,
{
    if req.responses.is_empty() {
        return Err(AppError::Validation(
            "At least one response is required".to_string(),
        ));
    }

    // Resolve every referenced question and option against the active
    // catalog before anything is written. Client-side values are never
    // trusted; only the ids travel in the request.
    let questions: HashMap<i64, i64> = catalog
        .list_questions(None)
        .await?
        .into_iter()
        .map(|q| (q.id, q.category_id))
        .collect();
    let options = catalog.list_answer_options().await?;
    let option_ids: Vec<i64> = options.iter().map(|o| o.id).collect();

    // Duplicate question ids within one submission collapse to the last
    // occurrence, mirroring the store's last-write-wins upsert.
    let mut deduped: Vec<ResponsePair> = Vec::with_capacity(req.responses.len());
    for pair in &req.responses {
        if !questions.contains_key(&pair.question_id) {
            return Err(AppError::Validation(format!(
                "Question {} does not exist or is inactive",
                pair.question_id
            )));
        }
        if !option_ids.contains(&pair.option_id) {
            return Err(AppError::Validation(format!(
                "Answer option {} does not exist or is inactive",
                pair.option_id
            )));
        }
        if let Some(existing) = deduped
            .iter_mut()
            .find(|p| p.question_id == pair.question_id)
        {
            existing.option_id = pair.option_id;
        } else {
            deduped.push(*pair);
        }
    }

    let attempt = attempts
        .create_attempt(
            req.user_id,
            req.display_name.as_deref(),
            req.display_email.as_deref(),
        )
        .await?;

    for pair in &deduped {
        attempts
            .upsert_response(attempt.id, pair.question_id, pair.option_id)
            .await?;
    }

    score_attempt(catalog, attempts, attempt.id).await?;

    tracing::info!(attempt_id = attempt.id, "attempt submitted and scored");

    Ok(SubmitOutcome {
        attempt_id: attempt.id,
        concluded: true,
        authorized: false,
    })
}

/// Scores an attempt from its persisted responses.
///
/// Must not run twice: if result rows already exist the call fails with a
/// `Conflict` instead of double-counting.
async fn score_attempt<C, A>(
    catalog: &C,
    attempts: &A,
    attempt_id: i64,
) -> Result<(), AppError>
where
    C: CatalogStore + ?Sized,
    A: AttemptStore + ?Sized,
{
    if attempts.has_results(attempt_id).await? {
        return Err(AppError::Conflict(
            "Attempt has already been scored".to_string(),
        ));
    }

    let responses = attempts.response_details(attempt_id).await?;

    // The scale ceiling comes from the live active options, never a constant.
    let max_option_value = catalog
        .list_answer_options()
        .await?
        .iter()
        .map(|o| o.value)
        .max()
        .unwrap_or(0);

    let outcome = score_responses(&responses, max_option_value);

    attempts
        .finalize_attempt(
            attempt_id,
            &outcome.per_category,
            outcome.total_score,
            outcome.dominant_category_id,
        )
        .await
}

/// The authorization gate: a one-way latch a privileged actor flips to make
/// results visible to the respondent.
pub async fn authorize_attempt<A: AttemptStore + ?Sized>(
    attempts: &A,
    attempt_id: i64,
) -> Result<Attempt, AppError> {
    let attempt = attempts
        .get_attempt(attempt_id)
        .await?
        .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    if !attempt.concluded {
        return Err(AppError::PreconditionFailed(
            "Attempt has not been concluded yet".to_string(),
        ));
    }
    if attempt.authorized {
        return Err(AppError::Conflict(
            "Attempt has already been authorized".to_string(),
        ));
    }

    let updated = attempts.set_authorized(attempt_id).await?;
    tracing::info!(attempt_id, "attempt authorized");
    Ok(updated)
}

/// Loads an attempt and projects it for the given viewer.
pub async fn get_attempt<A: AttemptStore + ?Sized>(
    attempts: &A,
    attempt_id: i64,
    viewer: Viewer,
    force_admin: bool,
) -> Result<ProjectedAttempt, AppError> {
    let attempt = attempts
        .get_attempt(attempt_id)
        .await?
        .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    let results = attempts
        .results_with_categories(attempt_id)
        .await?
        .into_iter()
        .map(|(result, category)| projection::project_result(&result, category))
        .collect();
    let responses = attempts.response_details(attempt_id).await?;

    Ok(projection::project(
        attempt,
        results,
        responses,
        viewer,
        force_admin,
    ))
}

/// Whether the user has at least one concluded attempt.
pub async fn has_completed_attempt<A: AttemptStore + ?Sized>(
    attempts: &A,
    user_id: i64,
) -> Result<bool, AppError> {
    attempts.has_completed(user_id).await
}

/// Attempts with owner info, newest first.
pub async fn list_attempts<A: AttemptStore + ?Sized>(
    attempts: &A,
    user_id: Option<i64>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<AttemptSummary>, i64), AppError> {
    attempts.list_attempts(user_id, limit.clamp(1, 200), offset.max(0)).await
}

/// The caller's most recent released result set, formatted for display.
/// An empty list means no authorized attempt exists yet; that is not an error.
pub async fn latest_authorized_results<A: AttemptStore + ?Sized>(
    attempts: &A,
    user_id: i64,
) -> Result<Vec<ProjectedResult>, AppError> {
    let attempt = match attempts.latest_authorized_attempt(user_id).await? {
        Some(attempt) => attempt,
        None => return Ok(Vec::new()),
    };

    Ok(attempts
        .results_with_categories(attempt.id)
        .await?
        .into_iter()
        .map(|(result, category)| projection::project_result(&result, category))
        .collect())
}
