use chrono::Utc;

use crate::config::EngineConfig;
use crate::db::operations::{plans, PlanItem, StudyPlan};
use crate::db::Database;
use crate::services::mastery::{self, Coverage, MasteryEntry};
use crate::services::{require_field, weak_points, ServiceError};

pub const MAX_RECOMMENDED_COUNT: i64 = 10;
const WEAK_RATIO_THRESHOLD: f64 = 0.5;
const WEAK_RATIO_BONUS: i64 = 2;

/// (attempts below, recommended questions). Less evidence means more practice.
const RECOMMENDED_COUNT_TABLE: &[(i64, i64)] = &[(1, 8), (5, 6), (10, 5), (20, 4)];
const WELL_PRACTICED_COUNT: i64 = 3;

pub fn recommended_count(entry: &MasteryEntry) -> i64 {
    let base = RECOMMENDED_COUNT_TABLE
        .iter()
        .find(|(below, _)| entry.total_count < *below)
        .map(|(_, count)| *count)
        .unwrap_or(WELL_PRACTICED_COUNT);

    let bonus = if entry.total_count > 0 && entry.ratio < WEAK_RATIO_THRESHOLD {
        WEAK_RATIO_BONUS
    } else {
        0
    };

    (base + bonus).min(MAX_RECOMMENDED_COUNT)
}

fn is_mastered(entry: &MasteryEntry, config: &EngineConfig) -> bool {
    entry.total_count >= config.plan_mastered_min_attempts && entry.ratio >= config.plan_mastered_ratio
}

/// Turns full-coverage mastery into ordered plan items, one per weak point.
pub fn plan_items(entries: &[MasteryEntry], config: &EngineConfig) -> Vec<PlanItem> {
    let candidates: Vec<MasteryEntry> = entries
        .iter()
        .filter(|e| !is_mastered(e, config))
        .cloned()
        .collect();

    weak_points::rank(&candidates, config.plan_max_items)
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| PlanItem {
            recommended_count: recommended_count(&entry),
            priority_rank: idx as i64 + 1,
            ratio: entry.ratio,
            knowledge_point_id: entry.knowledge_point_id,
            title: entry.title,
        })
        .collect()
}

/// Recomputes the plan from current mastery and replaces whatever plan the (user, subject)
/// pair had before.
pub async fn generate(
    db: &Database,
    config: &EngineConfig,
    user_id: &str,
    subject: &str,
) -> Result<StudyPlan, ServiceError> {
    let user_id = require_field(user_id, "userId")?;
    let subject = require_field(subject, "subject")?;

    let entries = mastery::user_mastery(db, &user_id, Some(&subject), Coverage::Full).await?;
    let items = plan_items(&entries, config);

    let plan = StudyPlan {
        id: uuid::Uuid::new_v4().to_string(),
        user_id,
        subject,
        items,
        generated_at: Utc::now(),
    };

    let stored = plans::replace_plan(db.pool(), &plan).await?;

    tracing::info!(
        user_id = %stored.user_id,
        subject = %stored.subject,
        items = stored.items.len(),
        "study plan generated"
    );

    Ok(stored)
}

pub async fn refresh(
    db: &Database,
    config: &EngineConfig,
    user_id: &str,
    subject: &str,
) -> Result<StudyPlan, ServiceError> {
    generate(db, config, user_id, subject).await
}

/// Read-mostly access: returns the stored plan, generating one only when none exists.
pub async fn get_or_generate(
    db: &Database,
    config: &EngineConfig,
    user_id: &str,
    subject: &str,
) -> Result<StudyPlan, ServiceError> {
    let user_id = require_field(user_id, "userId")?;
    let subject = require_field(subject, "subject")?;

    if let Some(plan) = plans::get_plan(db.pool(), &user_id, &subject).await? {
        return Ok(plan);
    }

    generate(db, config, &user_id, &subject).await
}
