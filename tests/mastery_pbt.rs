//! Property tests for mastery aggregation, weak-point ranking and plan items.
//!
//! - Counts: correct never exceeds total, ratios stay in [0, 1]
//! - Attempt order does not change aggregation
//! - Ranking is deterministic under input permutation
//! - Plan items respect the item limit and the recommended-count cap

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use k12_tutor_backend::config::EngineConfig;
use k12_tutor_backend::db::operations::{Attempt, AttemptSource, KnowledgePoint};
use k12_tutor_backend::services::mastery::{aggregate, subject_rollup, Coverage, MasteryEntry};
use k12_tutor_backend::services::study_plan::{plan_items, MAX_RECOMMENDED_COUNT};
use k12_tutor_backend::services::weak_points::rank;

// ============================================================================
// Arbitrary Generators
// ============================================================================

const POINT_IDS: &[&str] = &["kp-a", "kp-b", "kp-c", "kp-d", "kp-e"];

fn points() -> Vec<KnowledgePoint> {
    POINT_IDS
        .iter()
        .map(|id| KnowledgePoint {
            id: id.to_string(),
            subject: "math".to_string(),
            grade: None,
            title: id.to_uppercase(),
        })
        .collect()
}

fn arb_attempts() -> impl Strategy<Value = Vec<Attempt>> {
    prop::collection::vec((0..POINT_IDS.len(), any::<bool>(), 0i64..10_000), 0..80).prop_map(|raw| {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        raw.into_iter()
            .enumerate()
            .map(|(i, (point, correct, offset))| Attempt {
                id: format!("a{i}"),
                user_id: "u1".to_string(),
                question_id: format!("q{i}"),
                subject: "math".to_string(),
                knowledge_point_id: POINT_IDS[point].to_string(),
                correct,
                answer_given: String::new(),
                source: AttemptSource::Practice,
                created_at: base + Duration::minutes(offset),
            })
            .collect()
    })
}

fn arb_entries() -> impl Strategy<Value = Vec<MasteryEntry>> {
    arb_attempts().prop_map(|attempts| aggregate(&attempts, &points(), Coverage::Full))
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn counts_and_ratios_are_bounded(attempts in arb_attempts()) {
        let entries = aggregate(&attempts, &points(), Coverage::Practiced);
        let total: i64 = entries.iter().map(|e| e.total_count).sum();
        prop_assert_eq!(total, attempts.len() as i64);

        for e in &entries {
            prop_assert!(e.correct_count <= e.total_count);
            prop_assert!(e.total_count > 0);
            prop_assert!((0.0..=1.0).contains(&e.ratio));
        }

        let rollup = subject_rollup("math", &entries);
        prop_assert!(rollup.correct_count <= rollup.total_count);
        prop_assert!((0.0..=1.0).contains(&rollup.ratio));
    }

    #[test]
    fn attempt_order_does_not_matter(attempts in arb_attempts()) {
        let mut reversed = attempts.clone();
        reversed.reverse();
        prop_assert_eq!(
            aggregate(&attempts, &points(), Coverage::Full),
            aggregate(&reversed, &points(), Coverage::Full)
        );
    }

    #[test]
    fn ranking_is_deterministic(entries in arb_entries(), seed in any::<u64>(), limit in 1usize..8) {
        let mut shuffled = entries.clone();
        let len = shuffled.len();
        if len > 1 {
            shuffled.rotate_left((seed as usize) % len);
            shuffled.swap(0, len - 1);
        }

        let a = rank(&entries, limit);
        let b = rank(&shuffled, limit);
        prop_assert_eq!(&a, &b);
        prop_assert!(a.len() <= limit);
        for pair in a.windows(2) {
            prop_assert!(pair[0].ratio <= pair[1].ratio);
        }
    }

    #[test]
    fn plan_items_are_bounded(entries in arb_entries(), max_items in 1usize..6) {
        let config = EngineConfig { plan_max_items: max_items, ..EngineConfig::default() };
        let items = plan_items(&entries, &config);

        prop_assert!(items.len() <= max_items);
        for (idx, item) in items.iter().enumerate() {
            prop_assert_eq!(item.priority_rank, idx as i64 + 1);
            prop_assert!(item.recommended_count >= 1);
            prop_assert!(item.recommended_count <= MAX_RECOMMENDED_COUNT);
        }
    }
}
