// src/projection.rs

use serde::Serialize;

use crate::models::{
    attempt::{Attempt, CategoryResult, ResponseDetail},
    category::Category,
};
use crate::utils::slug::slugify;

/// Who is asking for an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Admin,
    Owner(i64),
    Anonymous,
}

/// One result row enriched with its category, as served to clients.
#[derive(Debug, Serialize)]
pub struct ProjectedResult {
    pub id: i64,
    pub category_id: i64,
    /// Stable identifier for the intelligence type, derived from the
    /// category name when the category carries no slug.
    pub intelligence_type: String,
    pub score: i64,
    pub percent: f64,
    pub category: Category,
}

/// The full attempt record: results, category detail and raw responses.
#[derive(Debug, Serialize)]
pub struct FullAttemptView {
    pub id: i64,
    pub user_id: Option<i64>,
    pub display_name: Option<String>,
    pub display_email: Option<String>,
    pub concluded: bool,
    pub authorized: bool,
    pub total_score: i64,
    pub dominant_category_id: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub results: Vec<ProjectedResult>,
    pub responses: Vec<ResponseDetail>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_admin_view: bool,
}

/// The restricted view served before a privileged actor releases the result.
/// Deliberately carries no score fields of any kind.
#[derive(Debug, Serialize)]
pub struct PendingAttemptView {
    pub id: i64,
    pub display_name: Option<String>,
    pub display_email: Option<String>,
    pub concluded: bool,
    pub authorized: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ProjectedAttempt {
    Full(FullAttemptView),
    Pending(PendingAttemptView),
}

/// Formats one stored result with its category for output.
pub fn project_result(result: &CategoryResult, category: Category) -> ProjectedResult {
    let intelligence_type = match &category.slug {
        Some(slug) if !slug.is_empty() => slug.clone(),
        _ => slugify(&category.name),
    };
    ProjectedResult {
        id: result.id,
        category_id: result.category_id,
        intelligence_type,
        score: result.score,
        percent: result.percent,
        category,
    }
}

/// Projects an attempt for a viewer.
///
/// Admins (and the `force_admin` escape hatch) always get the full record.
/// Everyone else gets the restricted pending view until the attempt is
/// authorized; after that the full record is visible to the respondent.
/// `results` must already be sorted by percent descending.
pub fn project(
    attempt: Attempt,
    results: Vec<ProjectedResult>,
    responses: Vec<ResponseDetail>,
    viewer: Viewer,
    force_admin: bool,
) -> ProjectedAttempt {
    let full = |is_admin_view: bool, attempt: Attempt| {
        ProjectedAttempt::Full(FullAttemptView {
            id: attempt.id,
            user_id: attempt.user_id,
            display_name: attempt.display_name,
            display_email: attempt.display_email,
            concluded: attempt.concluded,
            authorized: attempt.authorized,
            total_score: attempt.total_score,
            dominant_category_id: attempt.dominant_category_id,
            created_at: attempt.created_at,
            results,
            responses,
            is_admin_view,
        })
    };

    match viewer {
        Viewer::Admin => full(true, attempt),
        Viewer::Owner(_) | Viewer::Anonymous if force_admin => full(true, attempt),
        Viewer::Owner(_) | Viewer::Anonymous => {
            if attempt.authorized {
                full(false, attempt)
            } else {
                ProjectedAttempt::Pending(PendingAttemptView {
                    id: attempt.id,
                    display_name: attempt.display_name,
                    display_email: attempt.display_email,
                    concluded: attempt.concluded,
                    authorized: false,
                    created_at: attempt.created_at,
                    message: "Teste concluído. Aguardando autorização para visualizar resultados."
                        .to_string(),
                })
            }
        }
    }
}
