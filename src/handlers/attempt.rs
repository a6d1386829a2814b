// src/handlers/attempt.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::attempt::{
        Attempt, AttemptListParams, CompleteAttemptRequest, CompletionResponse,
        CreateAttemptRequest,
    },
    scoring::{locks::ScoringLocks, pipeline},
    utils::jwt::Claims,
};

const ATTEMPT_COLUMNS: &str =
    "id, user_id, checklist_id, start_time, end_time, score, completed, created_at";

/// Starts a new in-progress attempt for the caller.
pub async fn create_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let _exists: i64 = sqlx::query_scalar("SELECT id FROM checklists WHERE id = $1")
        .bind(payload.checklist_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Checklist not found".to_string()))?;

    let attempt: Attempt = sqlx::query_as(&format!(
        "INSERT INTO attempts (user_id, checklist_id) VALUES ($1, $2) RETURNING {ATTEMPT_COLUMNS}"
    ))
    .bind(user_id)
    .bind(payload.checklist_id)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Fetches one attempt. Owner or admin only.
pub async fn get_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let attempt: Attempt = sqlx::query_as(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    if attempt.user_id != user_id && !claims.is_admin() {
        return Err(AppError::Forbidden(
            "Attempt belongs to another user".to_string(),
        ));
    }

    Ok(Json(attempt))
}

/// Lists the caller's attempts, newest first.
pub async fn list_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<AttemptListParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let attempts: Vec<Attempt> = sqlx::query_as(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE user_id = $1
         ORDER BY created_at DESC, id DESC LIMIT $2"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(&pool)
    .await?;

    Ok(Json(attempts))
}

/// Completes an attempt: scores the submitted responses and updates every
/// aggregate derived from them. The heavy lifting lives in
/// `scoring::pipeline`; this handler only translates HTTP to engine calls.
pub async fn complete_attempt(
    State(pool): State<PgPool>,
    State(locks): State<ScoringLocks>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<CompleteAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let outcome = pipeline::complete_attempt(
        &pool,
        &locks,
        id,
        user_id,
        claims.is_admin(),
        &payload.responses,
    )
    .await?;

    Ok(Json(CompletionResponse {
        score: outcome.score,
        warning: outcome.warning,
    }))
}
