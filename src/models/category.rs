// src/models/category.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'categories' table: a grouping of checklist items used for
/// sub-scoring (e.g. "Anamnesis", "Physical Exam").
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
