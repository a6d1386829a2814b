// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        checklist::{Checklist, ChecklistItem, CreateChecklistItemRequest, CreateChecklistRequest},
        scenario::{CreateScenarioRequest, Scenario},
        specialty::{CreateSpecialtyRequest, Specialty},
        user::User,
    },
    utils::html::clean_html,
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let users: Vec<User> = sqlx::query_as(
        "SELECT id, username, password, role, score, rank, practice_count, created_at
         FROM users ORDER BY id ASC",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}

/// Creates a specialty.
/// Admin only.
pub async fn create_specialty(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateSpecialtyRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let specialty: Specialty = sqlx::query_as(
        "INSERT INTO specialties (name, code, description) VALUES ($1, $2, $3)
         RETURNING id, name, code, description, created_at",
    )
    .bind(&payload.name)
    .bind(&payload.code)
    .bind(payload.description.as_deref().map(clean_html))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict(format!("Specialty code '{}' already exists", payload.code))
        } else {
            tracing::error!("Failed to create specialty: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok((StatusCode::CREATED, Json(specialty)))
}

/// Creates a scenario under an existing specialty.
/// Admin only. The description is sanitized and the image URL, when present,
/// must parse as an absolute http(s) URL.
pub async fn create_scenario(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateScenarioRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let _specialty: i64 = sqlx::query_scalar("SELECT id FROM specialties WHERE id = $1")
        .bind(payload.specialty_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Specialty not found".to_string()))?;

    if let Some(image_url) = &payload.image_url {
        let parsed = url::Url::parse(image_url)
            .map_err(|_| AppError::BadRequest("Invalid image URL".to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AppError::BadRequest(
                "Image URL must use http or https".to_string(),
            ));
        }
    }

    let scenario: Scenario = sqlx::query_as(
        "INSERT INTO scenarios (title, description, specialty_id, difficulty, image_url)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, title, description, specialty_id, difficulty, image_url, created_at",
    )
    .bind(&payload.title)
    .bind(payload.description.as_deref().map(clean_html))
    .bind(payload.specialty_id)
    .bind(&payload.difficulty)
    .bind(&payload.image_url)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(scenario)))
}

/// Creates a checklist under an existing scenario.
/// Admin only.
pub async fn create_checklist(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateChecklistRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let _scenario: i64 = sqlx::query_scalar("SELECT id FROM scenarios WHERE id = $1")
        .bind(payload.scenario_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Scenario not found".to_string()))?;

    let checklist: Checklist = sqlx::query_as(
        "INSERT INTO checklists (title, description, scenario_id, time_limit)
         VALUES ($1, $2, $3, $4)
         RETURNING id, title, description, scenario_id, time_limit, created_at",
    )
    .bind(&payload.title)
    .bind(payload.description.as_deref().map(clean_html))
    .bind(payload.scenario_id)
    .bind(payload.time_limit)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(checklist)))
}

/// Adds an item to an existing checklist.
/// Admin only. The weight defaults to 1.0; zero and negative weights are
/// rejected by validation before the database CHECK ever sees them.
pub async fn create_checklist_item(
    State(pool): State<PgPool>,
    Path(checklist_id): Path<i64>,
    Json(payload): Json<CreateChecklistItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let _checklist: i64 = sqlx::query_scalar("SELECT id FROM checklists WHERE id = $1")
        .bind(checklist_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Checklist not found".to_string()))?;

    if let Some(category_id) = payload.category_id {
        let _category: i64 = sqlx::query_scalar("SELECT id FROM categories WHERE id = $1")
            .bind(category_id)
            .fetch_optional(&pool)
            .await?
            .ok_or(AppError::NotFound("Category not found".to_string()))?;
    }

    let item: ChecklistItem = sqlx::query_as(
        "INSERT INTO checklist_items (checklist_id, category_id, description, weight)
         VALUES ($1, $2, $3, $4)
         RETURNING id, checklist_id, category_id, description, weight, created_at",
    )
    .bind(checklist_id)
    .bind(payload.category_id)
    .bind(&payload.description)
    .bind(payload.weight.unwrap_or(1.0))
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(item)))
}
