// src/models/scenario.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'scenarios' table: a clinical case users practice against.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Scenario {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub specialty_id: i64,

    /// 'easy', 'medium' or 'hard'.
    pub difficulty: String,

    pub image_url: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Query parameters for listing scenarios.
#[derive(Debug, Deserialize)]
pub struct ScenarioListParams {
    pub specialty_id: Option<i64>,
}

/// DTO for creating a scenario (admin only).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateScenarioRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    pub specialty_id: i64,
    #[validate(custom(function = validate_difficulty))]
    pub difficulty: String,
    #[validate(length(max = 2000))]
    pub image_url: Option<String>,
}

fn validate_difficulty(difficulty: &str) -> Result<(), validator::ValidationError> {
    match difficulty {
        "easy" | "medium" | "hard" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_difficulty")),
    }
}
