// src/scoring/score.rs

use std::collections::{HashMap, HashSet};

use crate::config::MAX_SCORE;
use crate::models::attempt::ResponseInput;
use crate::models::checklist::ChecklistItem;

/// Resolves which checklist items count as completed for one attempt.
///
/// Responses referencing items outside the checklist are ignored. If the
/// submission carries more than one response for the same item, the first
/// one wins; later duplicates are dropped (the responses table enforces the
/// same policy with a unique constraint).
fn completed_item_ids(items: &[ChecklistItem], responses: &[ResponseInput]) -> HashSet<i64> {
    let known: HashSet<i64> = items.iter().map(|i| i.id).collect();

    let mut seen = HashSet::new();
    let mut completed = HashSet::new();
    for response in responses {
        if !known.contains(&response.checklist_item_id) {
            continue;
        }
        if !seen.insert(response.checklist_item_id) {
            continue;
        }
        if response.completed {
            completed.insert(response.checklist_item_id);
        }
    }
    completed
}

/// Computes the overall weighted score of an attempt, 0-10.
///
/// `score = (sum of weights of completed items / sum of all weights) * 10`.
/// Items with no response count as not completed. A checklist with no items
/// (total weight 0) scores 0 rather than dividing by zero.
pub fn attempt_score(items: &[ChecklistItem], responses: &[ResponseInput]) -> f64 {
    let total_weight: f64 = items.iter().map(|i| i.weight).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }

    let completed = completed_item_ids(items, responses);
    let earned_weight: f64 = items
        .iter()
        .filter(|i| completed.contains(&i.id))
        .map(|i| i.weight)
        .sum();

    ((earned_weight / total_weight) * MAX_SCORE).clamp(0.0, MAX_SCORE)
}

/// Computes the weighted sub-score per category represented in the checklist.
///
/// Items without a category are excluded entirely. The returned map only
/// contains categories that had at least one item in this checklist.
pub fn category_subscores(
    items: &[ChecklistItem],
    responses: &[ResponseInput],
) -> HashMap<i64, f64> {
    let completed = completed_item_ids(items, responses);

    // category -> (total weight, earned weight)
    let mut weights: HashMap<i64, (f64, f64)> = HashMap::new();
    for item in items {
        let Some(category_id) = item.category_id else {
            continue;
        };
        let entry = weights.entry(category_id).or_insert((0.0, 0.0));
        entry.0 += item.weight;
        if completed.contains(&item.id) {
            entry.1 += item.weight;
        }
    }

    weights
        .into_iter()
        .filter(|(_, (total, _))| *total > 0.0)
        .map(|(category_id, (total, earned))| {
            (category_id, ((earned / total) * MAX_SCORE).clamp(0.0, MAX_SCORE))
        })
        .collect()
}
