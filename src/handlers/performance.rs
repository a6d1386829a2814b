// src/handlers/performance.rs
//
// Read-only views over the aggregate tables the scoring engine maintains,
// plus the composite dashboard payload.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    config::{DEFAULT_RANKING_LIMIT, DEFAULT_RECOMMENDATION_LIMIT},
    error::AppError,
    models::{
        attempt::Attempt,
        performance::{CategoryMetric, DashboardResponse, LimitParams, SpecialtyMetric},
        user::{MeResponse, RankingEntry, User},
    },
    scoring::recommend::recommend_scenarios,
    utils::jwt::Claims,
};

fn ensure_self_or_admin(claims: &Claims, target_user_id: i64) -> Result<i64, AppError> {
    let caller_id = claims.user_id()?;
    if caller_id != target_user_id && !claims.is_admin() {
        return Err(AppError::Forbidden(
            "Performance data belongs to another user".to_string(),
        ));
    }
    Ok(caller_id)
}

async fn fetch_category_metrics(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<CategoryMetric>, AppError> {
    let metrics: Vec<CategoryMetric> = sqlx::query_as(
        "SELECT user_id, category_id, score, attempt_count, updated_at
         FROM performance_metrics WHERE user_id = $1 ORDER BY category_id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(metrics)
}

async fn fetch_specialty_metrics(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<SpecialtyMetric>, AppError> {
    let metrics: Vec<SpecialtyMetric> = sqlx::query_as(
        "SELECT user_id, specialty_id, score, attempts, last_attempt, updated_at
         FROM specialty_performance WHERE user_id = $1 ORDER BY specialty_id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(metrics)
}

/// Per-category performance for one user. Self or admin.
pub async fn get_user_performance(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_self_or_admin(&claims, user_id)?;

    Ok(Json(fetch_category_metrics(&pool, user_id).await?))
}

/// Per-specialty performance for one user. Self or admin.
pub async fn get_user_specialty_performance(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_self_or_admin(&claims, user_id)?;

    Ok(Json(fetch_specialty_metrics(&pool, user_id).await?))
}

/// Practice recommendations for the caller: weakest scenarios first, padded
/// with scenarios never attempted.
pub async fn get_recommendations(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<LimitParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_RECOMMENDATION_LIMIT)
        .clamp(1, 20);

    Ok(Json(recommend_scenarios(&pool, user_id, limit).await?))
}

/// One-shot dashboard payload: profile, both metric families, recent
/// attempts, ranking head and recommendations.
pub async fn get_dashboard(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let user: User = sqlx::query_as(
        "SELECT id, username, password, role, score, rank, practice_count, created_at
         FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    let specialty_performance = fetch_specialty_metrics(&pool, user_id).await?;
    let category_performance = fetch_category_metrics(&pool, user_id).await?;

    let recent_attempts: Vec<Attempt> = sqlx::query_as(
        "SELECT id, user_id, checklist_id, start_time, end_time, score, completed, created_at
         FROM attempts WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT 5",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    let ranking: Vec<RankingEntry> = sqlx::query_as(
        "SELECT id, username, score, rank, practice_count
         FROM users ORDER BY score DESC, id ASC LIMIT $1",
    )
    .bind(DEFAULT_RANKING_LIMIT)
    .fetch_all(&pool)
    .await?;

    let recommendations =
        recommend_scenarios(&pool, user_id, DEFAULT_RECOMMENDATION_LIMIT).await?;

    Ok(Json(DashboardResponse {
        user: MeResponse {
            id: user.id,
            username: user.username,
            role: user.role,
            score: user.score,
            rank: user.rank,
            practice_count: user.practice_count,
            created_at: user.created_at,
        },
        specialty_performance,
        category_performance,
        recent_attempts,
        ranking,
        recommendations,
    }))
}
