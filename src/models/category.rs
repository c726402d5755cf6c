// src/models/category.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'categories' table: one intelligence type of the test.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,

    /// Display name, unique case-insensitively (e.g., "Lógico-Matemática").
    pub name: String,

    pub description: String,

    /// Text shown to a respondent whose dominant intelligence this is.
    pub result_text: String,

    /// Free-text trait list for this intelligence.
    pub characteristics: Option<String>,

    /// Free-text list of associated careers.
    pub careers: Option<String>,

    /// Display color (hex or CSS name, the frontend decides).
    pub color: String,

    /// URL slug. Derived from the name when absent.
    pub slug: Option<String>,

    pub active: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a category.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,
    #[validate(length(min = 1, max = 5000, message = "Description is required."))]
    pub description: String,
    #[validate(length(min = 1, max = 10000, message = "Result text is required."))]
    pub result_text: String,
    #[validate(length(max = 10000))]
    pub characteristics: Option<String>,
    #[validate(length(max = 10000))]
    pub careers: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Color is required."))]
    pub color: String,
}

/// DTO for updating a category. The full payload is required, like creation;
/// only `active` is optional and defaults to keeping the category enabled.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,
    #[validate(length(min = 1, max = 5000, message = "Description is required."))]
    pub description: String,
    #[validate(length(min = 1, max = 10000, message = "Result text is required."))]
    pub result_text: String,
    #[validate(length(max = 10000))]
    pub characteristics: Option<String>,
    #[validate(length(max = 10000))]
    pub careers: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Color is required."))]
    pub color: String,
    pub active: Option<bool>,
}
