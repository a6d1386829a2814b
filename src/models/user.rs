// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// User role: 'user' or 'admin'.
    pub role: String,

    /// Running average of all completed-attempt scores, 0-10.
    /// Owned by the scoring engine; never written elsewhere.
    pub score: f64,

    /// 1-based position in the global ranking. NULL until a rank rewrite
    /// has run for this user.
    pub rank: Option<i64>,

    /// Number of completed attempts.
    pub practice_count: i64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Aggregated profile data for the current user.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub score: f64,
    pub rank: Option<i64>,
    pub practice_count: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Row of the global ranking as exposed to clients.
#[derive(Debug, Serialize, FromRow)]
pub struct RankingEntry {
    pub id: i64,
    pub username: String,
    pub score: f64,
    pub rank: Option<i64>,
    pub practice_count: i64,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}
