use std::cmp::Ordering;

use crate::db::Database;
use crate::services::mastery::{self, Coverage, MasteryEntry};
use crate::services::{require_field, ServiceError};

/// Weakest first: lower ratio, then fewer attempts (less evidence), then title, then id.
pub fn compare_weakness(a: &MasteryEntry, b: &MasteryEntry) -> Ordering {
    a.ratio
        .total_cmp(&b.ratio)
        .then_with(|| a.total_count.cmp(&b.total_count))
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.knowledge_point_id.cmp(&b.knowledge_point_id))
}

pub fn rank(entries: &[MasteryEntry], limit: usize) -> Vec<MasteryEntry> {
    let mut ranked = entries.to_vec();
    ranked.sort_by(compare_weakness);
    ranked.truncate(limit);
    ranked
}

/// Weakest points of one user, optionally within a subject. `Coverage::Full` lets unpracticed
/// points compete as remediation candidates.
pub async fn for_user(
    db: &Database,
    user_id: &str,
    subject: Option<&str>,
    coverage: Coverage,
    limit: usize,
) -> Result<Vec<MasteryEntry>, ServiceError> {
    let user_id = require_field(user_id, "userId")?;
    let entries = mastery::user_mastery(db, &user_id, subject, coverage).await?;
    Ok(rank(&entries, limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, title: &str, correct: i64, total: i64) -> MasteryEntry {
        MasteryEntry {
            knowledge_point_id: id.to_string(),
            title: title.to_string(),
            correct_count: correct,
            total_count: total,
            ratio: crate::services::mastery::mastery_ratio(correct, total),
            last_attempt_at: None,
        }
    }

    #[test]
    fn sorts_ascending_by_ratio() {
        let entries = vec![entry("a", "A", 9, 10), entry("b", "B", 1, 10), entry("c", "C", 5, 10)];
        let ids: Vec<_> = rank(&entries, 10).into_iter().map(|e| e.knowledge_point_id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn equal_ratio_prefers_fewer_attempts() {
        let entries = vec![entry("many", "A", 5, 20), entry("few", "B", 1, 4)];
        let ranked = rank(&entries, 2);
        assert_eq!(ranked[0].knowledge_point_id, "few");
    }

    #[test]
    fn full_ties_break_on_title() {
        let entries = vec![entry("x", "Zeta", 0, 0), entry("y", "Alpha", 0, 0)];
        let ranked = rank(&entries, 2);
        assert_eq!(ranked[0].title, "Alpha");
    }

    #[test]
    fn limit_truncates_and_zero_limit_is_empty() {
        let entries = vec![entry("a", "A", 1, 2), entry("b", "B", 0, 2), entry("c", "C", 2, 2)];
        assert_eq!(rank(&entries, 2).len(), 2);
        assert!(rank(&entries, 0).is_empty());
        assert!(rank(&[], 5).is_empty());
    }

    #[test]
    fn ranking_is_deterministic_for_shuffled_input() {
        let entries = vec![
            entry("a", "Same", 1, 2),
            entry("b", "Same", 1, 2),
            entry("c", "Other", 0, 0),
        ];
        let mut reversed = entries.clone();
        reversed.reverse();
        assert_eq!(rank(&entries, 3), rank(&reversed, 3));
    }
}
