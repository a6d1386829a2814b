// src/models/specialty.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'specialties' table: a medical domain scenarios belong to
/// (e.g. Pediatrics, Surgery).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Specialty {
    pub id: i64,
    pub name: String,

    /// Short unique code, e.g. "PED".
    pub code: String,

    pub description: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a specialty (admin only).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSpecialtyRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 10))]
    pub code: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}
