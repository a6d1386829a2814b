// src/scoring/aggregate.rs

use std::cmp::Ordering;

/// Running-average update: `(old * n + new) / (n + 1)`.
///
/// Every historical attempt carries equal weight; this is a plain cumulative
/// mean, not exponential decay. Callers must invoke it exactly once per
/// completed attempt; the completion pipeline guarantees that by rejecting
/// already-completed attempts under a row lock.
pub fn cumulative_mean(old_score: f64, old_count: i64, new_value: f64) -> f64 {
    (old_score * old_count as f64 + new_value) / (old_count as f64 + 1.0)
}

/// A user's id and aggregate score, as read from the users table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserScore {
    pub user_id: i64,
    pub score: f64,
}

/// Assigns 1-based ranks to every user: score descending, ties broken by
/// user id ascending. The tie-break makes the ordering total, so re-running
/// with unchanged scores reproduces identical ranks.
pub fn assign_ranks(users: &[UserScore]) -> Vec<(i64, i64)> {
    let mut sorted = users.to_vec();
    sorted.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.user_id.cmp(&b.user_id))
    });

    sorted
        .iter()
        .enumerate()
        .map(|(position, user)| (user.user_id, (position + 1) as i64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cumulative_mean_over_three_attempts() {
        // Sub-scores 8, 6, 10 must average to 8 regardless of order.
        let mut score = 0.0;
        let mut count = 0;
        for value in [8.0, 6.0, 10.0] {
            score = cumulative_mean(score, count, value);
            count += 1;
        }
        assert_eq!(score, 8.0);
        assert_eq!(count, 3);

        let mut reordered = 0.0;
        let mut n = 0;
        for value in [10.0, 8.0, 6.0] {
            reordered = cumulative_mean(reordered, n, value);
            n += 1;
        }
        assert!((reordered - 8.0).abs() < 1e-9);
    }

    #[test]
    fn cumulative_mean_first_attempt_is_identity() {
        assert_eq!(cumulative_mean(0.0, 0, 7.5), 7.5);
    }

    #[test]
    fn ranks_sorted_by_score_descending() {
        let users = vec![
            UserScore { user_id: 1, score: 3.0 },
            UserScore { user_id: 2, score: 9.0 },
            UserScore { user_id: 3, score: 7.5 },
            UserScore { user_id: 4, score: 7.5 },
        ];

        let ranks = assign_ranks(&users);
        assert_eq!(ranks, vec![(2, 1), (3, 2), (4, 3), (1, 4)]);
    }

    #[test]
    fn tied_scores_break_by_user_id() {
        let users = vec![
            UserScore { user_id: 9, score: 5.0 },
            UserScore { user_id: 4, score: 5.0 },
        ];

        // Lower id wins the tie, deterministically.
        assert_eq!(assign_ranks(&users), vec![(4, 1), (9, 2)]);
    }

    #[test]
    fn recompute_with_unchanged_scores_is_stable() {
        let users = vec![
            UserScore { user_id: 1, score: 9.0 },
            UserScore { user_id: 2, score: 7.5 },
            UserScore { user_id: 3, score: 7.5 },
            UserScore { user_id: 4, score: 3.0 },
        ];

        let first = assign_ranks(&users);
        let second = assign_ranks(&users);
        assert_eq!(first, second);
        assert_eq!(first, vec![(1, 1), (2, 2), (3, 3), (4, 4)]);
    }

    #[test]
    fn empty_user_set_yields_no_ranks() {
        assert!(assign_ranks(&[]).is_empty());
    }
}
