use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;

use crate::db::operations::{challenges, ChallengeProgress, ChallengeTask, ClaimWrite, GoalType};
use crate::db::Database;
use crate::services::{ledger, require_field, ServiceError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttemptStats {
    pub total: i64,
    pub correct: i64,
}

impl AttemptStats {
    pub fn from_attempts(attempts: &[crate::db::operations::Attempt]) -> Self {
        Self {
            total: attempts.len() as i64,
            correct: attempts.iter().filter(|a| a.correct).count() as i64,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeStatus {
    #[serde(flatten)]
    pub task: ChallengeTask,
    pub progress_value: i64,
    pub completed: bool,
    pub claimed: bool,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClaimOutcome {
    Claimed {
        task_id: String,
        points_awarded: i64,
        balance: i64,
    },
    AlreadyClaimed {
        task_id: String,
        balance: i64,
    },
}

/// Counter value the task would have for these stats. Accuracy is a whole percentage and stays
/// at zero until the task's minimum attempt count is reached.
pub fn progress_for(task: &ChallengeTask, stats: &AttemptStats) -> i64 {
    match task.goal_type {
        GoalType::Count => stats.total,
        GoalType::Accuracy => {
            if stats.total == 0 || stats.total < task.min_attempts {
                return 0;
            }
            ((stats.correct as f64 / stats.total as f64) * 100.0).round() as i64
        }
    }
}

fn percentage(progress_value: i64, goal_value: i64) -> f64 {
    if goal_value <= 0 {
        return 100.0;
    }
    ((progress_value as f64 / goal_value as f64) * 100.0).clamp(0.0, 100.0)
}

/// Re-derives every task counter from the ledger. Stored counters never go down.
pub async fn sync_progress(db: &Database, user_id: &str) -> Result<Vec<ChallengeProgress>, ServiceError> {
    let user_id = require_field(user_id, "userId")?;
    let tasks = challenges::list_tasks(db.pool()).await?;
    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    let stats = AttemptStats::from_attempts(&ledger::list_by_user(db, &user_id).await?);
    let now = Utc::now();

    let mut updated = Vec::with_capacity(tasks.len());
    for task in &tasks {
        let value = progress_for(task, &stats);
        let progress = challenges::raise_progress(db.pool(), &user_id, task, value, now).await?;
        updated.push(progress);
    }

    tracing::debug!(user_id = %user_id, tasks = updated.len(), "challenge progress synced");
    Ok(updated)
}

pub async fn list_progress(db: &Database, user_id: &str) -> Result<Vec<ChallengeStatus>, ServiceError> {
    let user_id = require_field(user_id, "userId")?;
    let tasks = challenges::list_tasks(db.pool()).await?;
    let progress: HashMap<String, ChallengeProgress> = challenges::list_progress(db.pool(), &user_id)
        .await?
        .into_iter()
        .map(|p| (p.task_id.clone(), p))
        .collect();

    Ok(tasks
        .into_iter()
        .map(|task| {
            let (value, completed, claimed) = progress
                .get(&task.id)
                .map(|p| (p.progress_value, p.completed, p.claimed))
                .unwrap_or((0, false, false));
            ChallengeStatus {
                percentage: percentage(value, task.goal_value),
                task,
                progress_value: value,
                completed,
                claimed,
            }
        })
        .collect())
}

/// Claims the reward for a completed task. A repeated claim is a successful no-op.
pub async fn claim(db: &Database, user_id: &str, task_id: &str) -> Result<ClaimOutcome, ServiceError> {
    match try_claim(db, user_id, task_id).await {
        Err(ServiceError::AlreadyClaimed { task_id }) => {
            let balance = challenges::points_balance(db.pool(), user_id.trim()).await?;
            tracing::debug!(user_id = %user_id.trim(), task_id = %task_id, "duplicate claim ignored");
            Ok(ClaimOutcome::AlreadyClaimed { task_id, balance })
        }
        other => other,
    }
}

async fn try_claim(db: &Database, user_id: &str, task_id: &str) -> Result<ClaimOutcome, ServiceError> {
    let user_id = require_field(user_id, "userId")?;
    let task_id = require_field(task_id, "taskId")?;

    let task = challenges::get_task(db.pool(), &task_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("challenge {task_id} not found")))?;

    let stats = AttemptStats::from_attempts(&ledger::list_by_user(db, &user_id).await?);
    let now = Utc::now();
    challenges::raise_progress(db.pool(), &user_id, &task, progress_for(&task, &stats), now).await?;

    match challenges::claim_reward(db.pool(), &user_id, &task.id, task.reward_points, now).await? {
        ClaimWrite::Credited { balance } => {
            tracing::info!(
                user_id = %user_id,
                task_id = %task.id,
                points = task.reward_points,
                balance,
                "challenge reward claimed"
            );
            Ok(ClaimOutcome::Claimed {
                task_id: task.id,
                points_awarded: task.reward_points,
                balance,
            })
        }
        ClaimWrite::Unchanged => {
            let progress = challenges::get_progress(db.pool(), &user_id, &task.id).await?;
            match progress {
                Some(p) if p.claimed => Err(ServiceError::AlreadyClaimed { task_id: task.id }),
                _ => Err(ServiceError::NotCompleted { task_id: task.id }),
            }
        }
    }
}

pub async fn points_balance(db: &Database, user_id: &str) -> Result<i64, ServiceError> {
    let user_id = require_field(user_id, "userId")?;
    Ok(challenges::points_balance(db.pool(), &user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(goal_type: GoalType, goal: i64, min_attempts: i64) -> ChallengeTask {
        ChallengeTask {
            id: "t".to_string(),
            title: "t".to_string(),
            goal_type,
            goal_value: goal,
            reward_points: 10,
            min_attempts,
        }
    }

    #[test]
    fn count_tasks_track_total_attempts() {
        let stats = AttemptStats { total: 7, correct: 2 };
        assert_eq!(progress_for(&task(GoalType::Count, 5, 0), &stats), 7);
    }

    #[test]
    fn accuracy_waits_for_minimum_attempts() {
        let t = task(GoalType::Accuracy, 80, 10);
        assert_eq!(progress_for(&t, &AttemptStats { total: 9, correct: 9 }), 0);
        assert_eq!(progress_for(&t, &AttemptStats { total: 10, correct: 9 }), 90);
    }

    #[test]
    fn accuracy_with_no_attempts_is_zero() {
        let t = task(GoalType::Accuracy, 80, 0);
        assert_eq!(progress_for(&t, &AttemptStats::default()), 0);
    }

    #[test]
    fn percentage_is_clamped() {
        assert_eq!(percentage(10, 5), 100.0);
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(percentage(0, 0), 100.0);
    }
}
