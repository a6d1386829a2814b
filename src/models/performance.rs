// src/models/performance.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'performance_metrics' table, keyed by (user, category).
///
/// `score` is the cumulative mean of this user's per-category sub-scores;
/// `attempt_count` equals the number of completed attempts that contained at
/// least one item in the category.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CategoryMetric {
    pub user_id: i64,
    pub category_id: i64,
    pub score: f64,
    pub attempt_count: i64,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'specialty_performance' table, keyed by (user, specialty).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SpecialtyMetric {
    pub user_id: i64,
    pub specialty_id: i64,
    pub score: f64,
    pub attempts: i64,
    pub last_attempt: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Query parameters for ranking and recommendation endpoints.
#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

/// Everything the dashboard needs in one payload.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: crate::models::user::MeResponse,
    pub specialty_performance: Vec<SpecialtyMetric>,
    pub category_performance: Vec<CategoryMetric>,
    pub recent_attempts: Vec<crate::models::attempt::Attempt>,
    pub ranking: Vec<crate::models::user::RankingEntry>,
    pub recommendations: Vec<crate::models::scenario::Scenario>,
}
