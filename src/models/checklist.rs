// src/models/checklist.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'checklists' table: an ordered set of weighted items
/// describing the expected clinical actions for one scenario.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Checklist {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub scenario_id: i64,

    /// Time limit in minutes for a simulated exam run. NULL means untimed.
    pub time_limit: Option<i64>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents one row of 'checklist_items'.
/// Items are immutable once created; edits would silently invalidate every
/// historical score computed from them.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: i64,
    pub checklist_id: i64,

    /// Optional grouping used for per-category sub-scores. Items without a
    /// category contribute to the overall score only.
    pub category_id: Option<i64>,

    pub description: String,

    /// Positive weight, default 1.0.
    pub weight: f64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Query parameters for listing checklists.
#[derive(Debug, Deserialize)]
pub struct ChecklistListParams {
    pub scenario_id: Option<i64>,
}

/// DTO for creating a checklist (admin only).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateChecklistRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    pub scenario_id: i64,
    #[validate(range(min = 1, max = 600))]
    pub time_limit: Option<i64>,
}

/// DTO for adding an item to a checklist (admin only).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateChecklistItemRequest {
    pub category_id: Option<i64>,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    #[validate(range(min = 0.1, max = 100.0, message = "Weight must be positive."))]
    pub weight: Option<f64>,
}
