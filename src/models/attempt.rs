// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'attempts' table: one user's timed run through a checklist.
///
/// Lifecycle: created in-progress (no score, no end_time), then completed
/// exactly once. Once `completed` is true the row is immutable as far as
/// scoring is concerned.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub user_id: i64,
    pub checklist_id: i64,
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,

    /// Overall weighted score, 0-10. Set on completion.
    pub score: Option<f64>,

    pub completed: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for starting a new attempt.
#[derive(Debug, Deserialize)]
pub struct CreateAttemptRequest {
    pub checklist_id: i64,
}

/// One submitted checklist-item response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseInput {
    pub checklist_item_id: i64,
    pub completed: bool,
}

/// DTO for completing an attempt.
#[derive(Debug, Deserialize)]
pub struct CompleteAttemptRequest {
    pub responses: Vec<ResponseInput>,
}

/// Result of completing an attempt. `warning` is set when the score was
/// persisted but aggregate bookkeeping failed and needs operator attention.
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Query parameters for listing the caller's attempts.
#[derive(Debug, Deserialize)]
pub struct AttemptListParams {
    pub limit: Option<i64>,
}
