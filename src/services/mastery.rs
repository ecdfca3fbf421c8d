use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::operations::{classes, content, Attempt, KnowledgePoint};
use crate::db::Database;
use crate::services::{ledger, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    /// Only knowledge points with at least one attempt.
    #[default]
    Practiced,
    /// Every supplied knowledge point; unpracticed ones appear with zero counts.
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryEntry {
    pub knowledge_point_id: String,
    pub title: String,
    pub correct_count: i64,
    pub total_count: i64,
    pub ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMastery {
    pub subject: String,
    pub ratio: f64,
    pub practiced_points: usize,
    pub total_points: usize,
    pub correct_count: i64,
    pub total_count: i64,
}

pub fn mastery_ratio(correct: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (correct as f64 / total as f64).clamp(0.0, 1.0)
}

#[derive(Default)]
struct Tally {
    correct: i64,
    total: i64,
    last: Option<DateTime<Utc>>,
}

/// Groups attempts by knowledge point. Order of `attempts` does not matter; output is sorted by
/// knowledge point id.
pub fn aggregate(
    attempts: &[Attempt],
    knowledge_points: &[KnowledgePoint],
    coverage: Coverage,
) -> Vec<MasteryEntry> {
    let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();

    for attempt in attempts {
        let tally = tallies.entry(attempt.knowledge_point_id.as_str()).or_default();
        tally.total += 1;
        if attempt.correct {
            tally.correct += 1;
        }
        if tally.last.map_or(true, |last| attempt.created_at > last) {
            tally.last = Some(attempt.created_at);
        }
    }

    if coverage == Coverage::Full {
        for point in knowledge_points {
            tallies.entry(point.id.as_str()).or_default();
        }
    }

    let titles: BTreeMap<&str, &str> = knowledge_points
        .iter()
        .map(|p| (p.id.as_str(), p.title.as_str()))
        .collect();

    tallies
        .into_iter()
        .map(|(id, tally)| MasteryEntry {
            knowledge_point_id: id.to_string(),
            title: titles.get(id).copied().unwrap_or(id).to_string(),
            correct_count: tally.correct,
            total_count: tally.total,
            ratio: mastery_ratio(tally.correct, tally.total),
            last_attempt_at: tally.last,
        })
        .collect()
}

/// Subject ratio is the mean of per-point ratios over practiced points only, so unpracticed
/// points do not drag the average towards zero.
pub fn subject_rollup(subject: &str, entries: &[MasteryEntry]) -> SubjectMastery {
    let practiced: Vec<&MasteryEntry> = entries.iter().filter(|e| e.total_count > 0).collect();
    let ratio = if practiced.is_empty() {
        0.0
    } else {
        practiced.iter().map(|e| e.ratio).sum::<f64>() / practiced.len() as f64
    };

    SubjectMastery {
        subject: subject.to_string(),
        ratio,
        practiced_points: practiced.len(),
        total_points: entries.len(),
        correct_count: entries.iter().map(|e| e.correct_count).sum(),
        total_count: entries.iter().map(|e| e.total_count).sum(),
    }
}

/// Keeps attempts that belong to `subject`, either by their own subject tag or because their
/// knowledge point is one of the subject's points.
fn scope_to_subject(attempts: Vec<Attempt>, subject: &str, points: &[KnowledgePoint]) -> Vec<Attempt> {
    let point_ids: HashSet<&str> = points.iter().map(|p| p.id.as_str()).collect();
    attempts
        .into_iter()
        .filter(|a| a.subject == subject || point_ids.contains(a.knowledge_point_id.as_str()))
        .collect()
}

pub async fn user_mastery(
    db: &Database,
    user_id: &str,
    subject: Option<&str>,
    coverage: Coverage,
) -> Result<Vec<MasteryEntry>, ServiceError> {
    let attempts = ledger::list_by_user(db, user_id).await?;
    let points = content::list_knowledge_points(db.pool(), subject).await?;

    let attempts = match subject {
        Some(subject) => scope_to_subject(attempts, subject, &points),
        None => attempts,
    };

    Ok(aggregate(&attempts, &points, coverage))
}

pub async fn subject_summary(db: &Database, user_id: &str) -> Result<Vec<SubjectMastery>, ServiceError> {
    let attempts = ledger::list_by_user(db, user_id).await?;
    let points = content::list_knowledge_points(db.pool(), None).await?;

    let subjects: BTreeSet<&str> = points
        .iter()
        .map(|p| p.subject.as_str())
        .chain(attempts.iter().map(|a| a.subject.as_str()))
        .filter(|s| !s.is_empty())
        .collect();

    Ok(subjects
        .into_iter()
        .map(|subject| {
            let subject_points: Vec<KnowledgePoint> =
                points.iter().filter(|p| p.subject == subject).cloned().collect();
            let scoped = scope_to_subject(attempts.clone(), subject, &subject_points);
            let entries = aggregate(&scoped, &subject_points, Coverage::Full);
            subject_rollup(subject, &entries)
        })
        .collect())
}

/// Cohort mastery over every member of a class.
pub async fn class_mastery(
    db: &Database,
    class_id: &str,
    subject: &str,
) -> Result<Vec<MasteryEntry>, ServiceError> {
    if classes::get_class(db.pool(), class_id).await?.is_none() {
        return Err(ServiceError::not_found(format!("class {class_id} not found")));
    }

    let members = classes::list_class_members(db.pool(), class_id).await?;
    let attempts = ledger::list_by_users(db, &members).await?;
    let points = content::list_knowledge_points(db.pool(), Some(subject)).await?;
    let scoped = scope_to_subject(attempts, subject, &points);

    tracing::debug!(
        class_id,
        members = members.len(),
        attempts = scoped.len(),
        "class mastery aggregated"
    );

    Ok(aggregate(&scoped, &points, Coverage::Full))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::operations::AttemptSource;
    use chrono::Duration;

    fn attempt(kp: &str, correct: bool, minutes_ago: i64) -> Attempt {
        Attempt {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: "u1".to_string(),
            question_id: format!("q-{kp}"),
            subject: "math".to_string(),
            knowledge_point_id: kp.to_string(),
            correct,
            answer_given: String::new(),
            source: AttemptSource::Practice,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    fn point(id: &str, title: &str) -> KnowledgePoint {
        KnowledgePoint {
            id: id.to_string(),
            subject: "math".to_string(),
            grade: None,
            title: title.to_string(),
        }
    }

    #[test]
    fn six_of_ten_correct_gives_point_six() {
        let attempts: Vec<Attempt> = (0..10).map(|i| attempt("k", i < 6, i)).collect();
        let entries = aggregate(&attempts, &[point("k", "Fractions")], Coverage::Practiced);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].total_count, 10);
        assert_eq!(entries[0].correct_count, 6);
        assert!((entries[0].ratio - 0.6).abs() < 1e-9);
        assert_eq!(entries[0].title, "Fractions");
    }

    #[test]
    fn full_coverage_includes_unpracticed_points() {
        let attempts = vec![attempt("a", true, 1)];
        let points = [point("a", "A"), point("b", "B")];

        let practiced = aggregate(&attempts, &points, Coverage::Practiced);
        let full = aggregate(&attempts, &points, Coverage::Full);

        assert_eq!(practiced.len(), 1);
        assert_eq!(full.len(), 2);
        let b = full.iter().find(|e| e.knowledge_point_id == "b").unwrap();
        assert_eq!(b.total_count, 0);
        assert_eq!(b.ratio, 0.0);
        assert!(b.last_attempt_at.is_none());
    }

    #[test]
    fn last_attempt_is_latest_regardless_of_order() {
        let newest = attempt("a", false, 1);
        let attempts = vec![attempt("a", true, 30), newest.clone(), attempt("a", true, 10)];
        let entries = aggregate(&attempts, &[], Coverage::Practiced);
        assert_eq!(entries[0].last_attempt_at, Some(newest.created_at));
        assert_eq!(entries[0].title, "a");
    }

    #[test]
    fn empty_input_yields_empty_result() {
        assert!(aggregate(&[], &[], Coverage::Full).is_empty());
        let rollup = subject_rollup("math", &[]);
        assert_eq!(rollup.ratio, 0.0);
        assert_eq!(rollup.practiced_points, 0);
    }

    #[test]
    fn rollup_ignores_unpracticed_points() {
        let mut attempts = vec![attempt("a", true, 1), attempt("a", true, 2)];
        attempts.push(attempt("b", false, 3));
        let points = [point("a", "A"), point("b", "B"), point("c", "C")];
        let entries = aggregate(&attempts, &points, Coverage::Full);

        let rollup = subject_rollup("math", &entries);
        assert!((rollup.ratio - 0.5).abs() < 1e-9);
        assert_eq!(rollup.practiced_points, 2);
        assert_eq!(rollup.total_points, 3);
        assert_eq!(rollup.total_count, 3);
    }
}
