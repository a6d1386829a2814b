// src/scoring/recommend.rs

use std::collections::{HashMap, HashSet};

use sqlx::PgPool;

use crate::config::REMEDIATION_THRESHOLD;
use crate::error::AppError;
use crate::models::scenario::Scenario;

/// One completed attempt reduced to the scenario it exercised and the score
/// it achieved.
#[derive(Debug, Clone, Copy)]
pub struct AttemptOutcome {
    pub scenario_id: i64,
    pub score: f64,
}

/// Picks up to `limit` scenario ids for remediation.
///
/// Preference order: scenarios from completed attempts scoring below the
/// remediation threshold, worst first (ties by scenario id), deduplicated;
/// then scenarios the user has never attempted, in the caller-provided
/// stable order. Returns fewer than `limit` when the pool runs dry.
pub fn select_scenarios(
    completed: &[AttemptOutcome],
    never_attempted: &[i64],
    limit: usize,
) -> Vec<i64> {
    let mut low_scoring: Vec<&AttemptOutcome> = completed
        .iter()
        .filter(|outcome| outcome.score < REMEDIATION_THRESHOLD)
        .collect();
    low_scoring.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.scenario_id.cmp(&b.scenario_id))
    });

    let mut picked = Vec::new();
    let mut seen = HashSet::new();
    for outcome in low_scoring {
        if picked.len() >= limit {
            break;
        }
        if seen.insert(outcome.scenario_id) {
            picked.push(outcome.scenario_id);
        }
    }

    for &scenario_id in never_attempted {
        if picked.len() >= limit {
            break;
        }
        if seen.insert(scenario_id) {
            picked.push(scenario_id);
        }
    }

    picked
}

/// Read-only engine operation: recommendation scenarios for one user.
///
/// Runs against attempt history only; no aggregate state is touched.
pub async fn recommend_scenarios(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<Scenario>, AppError> {
    let completed_rows: Vec<(i64, f64)> = sqlx::query_as(
        r#"
        SELECT c.scenario_id, a.score
        FROM attempts a
        JOIN checklists c ON c.id = a.checklist_id
        WHERE a.user_id = $1 AND a.completed = TRUE AND a.score IS NOT NULL
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let completed: Vec<AttemptOutcome> = completed_rows
        .into_iter()
        .map(|(scenario_id, score)| AttemptOutcome { scenario_id, score })
        .collect();

    // Attempts in any state take a scenario out of the "new to you" pool.
    let never_attempted: Vec<i64> = sqlx::query_scalar(
        r#"
        SELECT s.id
        FROM scenarios s
        WHERE s.id NOT IN (
            SELECT c.scenario_id
            FROM attempts a
            JOIN checklists c ON c.id = a.checklist_id
            WHERE a.user_id = $1
        )
        ORDER BY s.id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let picked = select_scenarios(&completed, &never_attempted, limit.max(0) as usize);
    if picked.is_empty() {
        return Ok(Vec::new());
    }

    let mut query_builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
        "SELECT id, title, description, specialty_id, difficulty, image_url, created_at
         FROM scenarios WHERE id IN (",
    );
    let mut separated = query_builder.separated(",");
    for id in &picked {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");

    let scenarios: Vec<Scenario> = query_builder.build_query_as().fetch_all(pool).await?;

    // Restore selection order; the IN query returns rows in table order.
    let mut by_id: HashMap<i64, Scenario> =
        scenarios.into_iter().map(|s| (s.id, s)).collect();
    Ok(picked.iter().filter_map(|id| by_id.remove(id)).collect())
}
