// src/scoring/pipeline.rs
//
// Completion pipeline: weighted score -> category metrics -> specialty
// metric -> user aggregate -> global rank. Stages are pure functions from
// `score`, `aggregate` and `recommend`; this module owns persistence,
// transactions and locking.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::attempt::{Attempt, ResponseInput};
use crate::models::checklist::ChecklistItem;
use crate::scoring::aggregate::{UserScore, assign_ranks, cumulative_mean};
use crate::scoring::locks::ScoringLocks;
use crate::scoring::score::{attempt_score, category_subscores};

const ATTEMPT_COLUMNS: &str =
    "id, user_id, checklist_id, start_time, end_time, score, completed, created_at";

/// Outcome of a completion. `warning` is set when the score was persisted but
/// aggregate bookkeeping failed; the caller surfaces it instead of swallowing
/// the inconsistency.
#[derive(Debug)]
pub struct CompletionOutcome {
    pub score: f64,
    pub warning: Option<String>,
}

/// Rejects re-scoring. Aggregates are append-only: processing the same
/// attempt twice would corrupt every cumulative mean derived from it.
fn ensure_not_completed(attempt: &Attempt) -> Result<(), AppError> {
    if attempt.completed {
        return Err(AppError::AlreadyCompleted(
            "Attempt has already been completed".to_string(),
        ));
    }
    Ok(())
}

/// Scores and completes an attempt, then updates every aggregate that hangs
/// off it.
///
/// The attempt's own score is committed first and survives any aggregation
/// failure: the user always gets their grade. Aggregation (category metrics,
/// specialty metric, user aggregate) runs in a single all-or-nothing
/// transaction, and the rank rewrite is serialized globally. The per-user
/// lock is held from the completed-flag check to the last rank write so two
/// completions by the same user can never interleave.
pub async fn complete_attempt(
    pool: &PgPool,
    locks: &ScoringLocks,
    attempt_id: i64,
    caller_id: i64,
    caller_is_admin: bool,
    responses: &[ResponseInput],
) -> Result<CompletionOutcome, AppError> {
    let attempt: Attempt = sqlx::query_as(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE id = $1"
    ))
    .bind(attempt_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;

    // Ownership is checked before any scoring logic runs.
    if attempt.user_id != caller_id && !caller_is_admin {
        return Err(AppError::Forbidden(
            "Attempt belongs to another user".to_string(),
        ));
    }

    let _user_guard = locks.lock_user(attempt.user_id).await;

    let (attempt, items, score, end_time) =
        score_and_persist(pool, attempt_id, responses).await?;

    // Aggregation must not void the persisted score, but it must not fail
    // silently either.
    let mut warning = None;
    if let Err(e) = aggregate_attempt(pool, &attempt, score, end_time, &items, responses).await {
        tracing::error!(
            attempt_id = attempt.id,
            user_id = attempt.user_id,
            "Aggregate update failed after scoring; metrics are stale: {}",
            e
        );
        warning = Some(format!("Performance aggregation failed: {}", e));
    } else if let Err(e) = recompute_ranks(pool, locks).await {
        tracing::error!(
            user_id = attempt.user_id,
            "Rank recomputation failed; ranks are stale: {}",
            e
        );
        warning = Some(format!("Ranking update failed: {}", e));
    }

    Ok(CompletionOutcome { score, warning })
}

/// Stage 1: the scoring transaction. Re-reads the attempt under a row lock,
/// rejects double completion, stores the responses and stamps the attempt
/// with its score. Committed before any aggregate is touched.
async fn score_and_persist(
    pool: &PgPool,
    attempt_id: i64,
    responses: &[ResponseInput],
) -> Result<(Attempt, Vec<ChecklistItem>, f64, DateTime<Utc>), AppError> {
    let mut tx = pool.begin().await?;

    let attempt: Attempt = sqlx::query_as(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE id = $1 FOR UPDATE"
    ))
    .bind(attempt_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;

    ensure_not_completed(&attempt)?;

    let items: Vec<ChecklistItem> = sqlx::query_as(
        "SELECT id, checklist_id, category_id, description, weight, created_at
         FROM checklist_items WHERE checklist_id = $1 ORDER BY id",
    )
    .bind(attempt.checklist_id)
    .fetch_all(&mut *tx)
    .await?;

    insert_responses(&mut tx, attempt_id, &items, responses).await?;

    let score = attempt_score(&items, responses);
    let end_time = Utc::now();

    sqlx::query("UPDATE attempts SET end_time = $1, score = $2, completed = TRUE WHERE id = $3")
        .bind(end_time)
        .bind(score)
        .bind(attempt_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok((attempt, items, score, end_time))
}

/// Persists one response row per known checklist item, first submission wins.
/// Responses pointing outside the checklist are dropped here and ignored by
/// the scorer, so storage and math agree.
async fn insert_responses(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    attempt_id: i64,
    items: &[ChecklistItem],
    responses: &[ResponseInput],
) -> Result<(), AppError> {
    let known: std::collections::HashSet<i64> = items.iter().map(|i| i.id).collect();

    let mut seen = std::collections::HashSet::new();
    let mut to_insert = Vec::new();
    for response in responses {
        if known.contains(&response.checklist_item_id) && seen.insert(response.checklist_item_id) {
            to_insert.push(response);
        }
    }
    if to_insert.is_empty() {
        return Ok(());
    }

    let mut query_builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO responses (attempt_id, checklist_item_id, completed) ",
    );
    query_builder.push_values(to_insert, |mut b, response| {
        b.push_bind(attempt_id)
            .push_bind(response.checklist_item_id)
            .push_bind(response.completed);
    });
    query_builder.push(" ON CONFLICT (attempt_id, checklist_item_id) DO NOTHING");
    query_builder.build().execute(&mut **tx).await?;

    Ok(())
}

/// Stage 2: one all-or-nothing transaction over the aggregate tables.
///
/// The scenario and specialty are resolved before anything is written; if
/// resolution fails the aggregates are left untouched and the error is
/// surfaced to the caller, never partially applied.
async fn aggregate_attempt(
    pool: &PgPool,
    attempt: &Attempt,
    score: f64,
    end_time: DateTime<Utc>,
    items: &[ChecklistItem],
    responses: &[ResponseInput],
) -> Result<(), AppError> {
    let specialty_id: i64 = sqlx::query_scalar(
        "SELECT s.specialty_id
         FROM checklists c JOIN scenarios s ON s.id = c.scenario_id
         WHERE c.id = $1",
    )
    .bind(attempt.checklist_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        AppError::NotFound("Scenario or specialty for checklist not found".to_string())
    })?;

    let mut tx = pool.begin().await?;

    // Category metrics: cumulative mean per (user, category) touched by this
    // attempt. Sorted for a deterministic write order.
    let mut sub_scores: Vec<(i64, f64)> = category_subscores(items, responses).into_iter().collect();
    sub_scores.sort_by_key(|(category_id, _)| *category_id);

    for (category_id, category_score) in sub_scores {
        let existing: Option<(f64, i64)> = sqlx::query_as(
            "SELECT score, attempt_count FROM performance_metrics
             WHERE user_id = $1 AND category_id = $2",
        )
        .bind(attempt.user_id)
        .bind(category_id)
        .fetch_optional(&mut *tx)
        .await?;

        match existing {
            Some((old_score, old_count)) => {
                sqlx::query(
                    "UPDATE performance_metrics
                     SET score = $1, attempt_count = $2, updated_at = NOW()
                     WHERE user_id = $3 AND category_id = $4",
                )
                .bind(cumulative_mean(old_score, old_count, category_score))
                .bind(old_count + 1)
                .bind(attempt.user_id)
                .bind(category_id)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query(
                    "INSERT INTO performance_metrics (user_id, category_id, score, attempt_count)
                     VALUES ($1, $2, $3, 1)",
                )
                .bind(attempt.user_id)
                .bind(category_id)
                .bind(category_score)
                .execute(&mut *tx)
                .await?;
            }
        }
    }

    // Specialty metric: cumulative mean of overall attempt scores.
    let existing: Option<(f64, i64)> = sqlx::query_as(
        "SELECT score, attempts FROM specialty_performance
         WHERE user_id = $1 AND specialty_id = $2",
    )
    .bind(attempt.user_id)
    .bind(specialty_id)
    .fetch_optional(&mut *tx)
    .await?;

    match existing {
        Some((old_score, old_count)) => {
            sqlx::query(
                "UPDATE specialty_performance
                 SET score = $1, attempts = $2, last_attempt = $3, updated_at = NOW()
                 WHERE user_id = $4 AND specialty_id = $5",
            )
            .bind(cumulative_mean(old_score, old_count, score))
            .bind(old_count + 1)
            .bind(end_time)
            .bind(attempt.user_id)
            .bind(specialty_id)
            .execute(&mut *tx)
            .await?;
        }
        None => {
            sqlx::query(
                "INSERT INTO specialty_performance (user_id, specialty_id, score, attempts, last_attempt)
                 VALUES ($1, $2, $3, 1, $4)",
            )
            .bind(attempt.user_id)
            .bind(specialty_id)
            .bind(score)
            .bind(end_time)
            .execute(&mut *tx)
            .await?;
        }
    }

    // User aggregate: recomputed from the full set of completed attempts
    // rather than incrementally, so it can never drift.
    let (average, count): (Option<f64>, i64) = sqlx::query_as(
        "SELECT AVG(score), COUNT(*) FROM attempts
         WHERE user_id = $1 AND completed = TRUE",
    )
    .bind(attempt.user_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE users SET score = $1, practice_count = $2 WHERE id = $3")
        .bind(average.unwrap_or(0.0))
        .bind(count)
        .bind(attempt.user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

/// Stage 3: full-table rank rewrite, serialized behind the rank lock.
///
/// Fetch all (id, score) pairs, assign positions in memory, write back in one
/// batched statement. O(n log n) per completed attempt is fine at thousands
/// of users; batching the rewrite into a background job is the first lever if
/// that stops being true.
pub async fn recompute_ranks(pool: &PgPool, locks: &ScoringLocks) -> Result<(), AppError> {
    let _rank_guard = locks.lock_rank().await;

    let rows: Vec<(i64, f64)> = sqlx::query_as("SELECT id, score FROM users")
        .fetch_all(pool)
        .await?;
    if rows.is_empty() {
        return Ok(());
    }

    let scores: Vec<UserScore> = rows
        .iter()
        .map(|&(user_id, score)| UserScore { user_id, score })
        .collect();
    let ranks = assign_ranks(&scores);

    let mut query_builder =
        QueryBuilder::<Postgres>::new("UPDATE users AS u SET rank = v.rank FROM (");
    query_builder.push_values(ranks, |mut b, (user_id, rank)| {
        b.push_bind(user_id).push_bind(rank);
    });
    query_builder.push(") AS v(id, rank) WHERE u.id = v.id");
    query_builder.build().execute(pool).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(completed: bool) -> Attempt {
        Attempt {
            id: 1,
            user_id: 1,
            checklist_id: 1,
            start_time: None,
            end_time: None,
            score: if completed { Some(5.0) } else { None },
            completed,
            created_at: None,
        }
    }

    #[test]
    fn completed_attempts_are_rejected() {
        let err = ensure_not_completed(&attempt(true)).unwrap_err();
        assert!(matches!(err, AppError::AlreadyCompleted(_)));
    }

    #[test]
    fn in_progress_attempts_pass_the_guard() {
        assert!(ensure_not_completed(&attempt(false)).is_ok());
    }
}
