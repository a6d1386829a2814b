// src/handlers/catalog.rs
//
// Public read-only catalog: specialties, scenarios, checklists, categories
// and the global ranking.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    config::DEFAULT_RANKING_LIMIT,
    error::AppError,
    models::{
        category::Category,
        checklist::{Checklist, ChecklistItem, ChecklistListParams},
        performance::LimitParams,
        scenario::{Scenario, ScenarioListParams},
        specialty::Specialty,
        user::RankingEntry,
    },
};

const SCENARIO_COLUMNS: &str =
    "id, title, description, specialty_id, difficulty, image_url, created_at";
const CHECKLIST_COLUMNS: &str = "id, title, description, scenario_id, time_limit, created_at";

/// Lists all specialties, alphabetically.
pub async fn list_specialties(
    State(pool): State<PgPool>,
) -> Result<impl IntoResponse, AppError> {
    let specialties: Vec<Specialty> = sqlx::query_as(
        "SELECT id, name, code, description, created_at FROM specialties ORDER BY name ASC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(specialties))
}

pub async fn get_specialty(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let specialty: Specialty = sqlx::query_as(
        "SELECT id, name, code, description, created_at FROM specialties WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Specialty not found".to_string()))?;

    Ok(Json(specialty))
}

/// Lists scenarios, optionally filtered by specialty.
pub async fn list_scenarios(
    State(pool): State<PgPool>,
    Query(params): Query<ScenarioListParams>,
) -> Result<impl IntoResponse, AppError> {
    let scenarios: Vec<Scenario> = match params.specialty_id {
        Some(specialty_id) => {
            sqlx::query_as(&format!(
                "SELECT {SCENARIO_COLUMNS} FROM scenarios WHERE specialty_id = $1 ORDER BY id ASC"
            ))
            .bind(specialty_id)
            .fetch_all(&pool)
            .await?
        }
        None => {
            sqlx::query_as(&format!(
                "SELECT {SCENARIO_COLUMNS} FROM scenarios ORDER BY id ASC"
            ))
            .fetch_all(&pool)
            .await?
        }
    };

    Ok(Json(scenarios))
}

pub async fn get_scenario(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let scenario: Scenario = sqlx::query_as(&format!(
        "SELECT {SCENARIO_COLUMNS} FROM scenarios WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Scenario not found".to_string()))?;

    Ok(Json(scenario))
}

/// Lists checklists, optionally filtered by scenario.
pub async fn list_checklists(
    State(pool): State<PgPool>,
    Query(params): Query<ChecklistListParams>,
) -> Result<impl IntoResponse, AppError> {
    let checklists: Vec<Checklist> = match params.scenario_id {
        Some(scenario_id) => {
            sqlx::query_as(&format!(
                "SELECT {CHECKLIST_COLUMNS} FROM checklists WHERE scenario_id = $1 ORDER BY id ASC"
            ))
            .bind(scenario_id)
            .fetch_all(&pool)
            .await?
        }
        None => {
            sqlx::query_as(&format!(
                "SELECT {CHECKLIST_COLUMNS} FROM checklists ORDER BY id ASC"
            ))
            .fetch_all(&pool)
            .await?
        }
    };

    Ok(Json(checklists))
}

pub async fn get_checklist(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let checklist: Checklist = sqlx::query_as(&format!(
        "SELECT {CHECKLIST_COLUMNS} FROM checklists WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Checklist not found".to_string()))?;

    Ok(Json(checklist))
}

/// Lists the items of one checklist. 404s when the checklist itself is
/// missing so clients can tell "empty checklist" from "no such checklist".
pub async fn list_checklist_items(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let _exists: i64 = sqlx::query_scalar("SELECT id FROM checklists WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Checklist not found".to_string()))?;

    let items: Vec<ChecklistItem> = sqlx::query_as(
        "SELECT id, checklist_id, category_id, description, weight, created_at
         FROM checklist_items WHERE checklist_id = $1 ORDER BY id ASC",
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(items))
}

pub async fn list_categories(
    State(pool): State<PgPool>,
) -> Result<impl IntoResponse, AppError> {
    let categories: Vec<Category> = sqlx::query_as(
        "SELECT id, name, description, created_at FROM categories ORDER BY name ASC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(categories))
}

/// Top of the global ranking.
///
/// Ordered by score descending with user id as tie-break, which is exactly
/// the order the rank rewrite assigns. Sorting by the stored rank column
/// would misorder users who joined since the last rewrite (rank still NULL).
pub async fn get_ranking(
    State(pool): State<PgPool>,
    Query(params): Query<LimitParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_RANKING_LIMIT).clamp(1, 100);

    let entries: Vec<RankingEntry> = sqlx::query_as(
        "SELECT id, username, score, rank, practice_count
         FROM users ORDER BY score DESC, id ASC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(&pool)
    .await?;

    Ok(Json(entries))
}
