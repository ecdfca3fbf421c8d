use crate::db::operations::{challenges, ChallengeTask, GoalType};
use crate::db::Database;

struct DefaultTask {
    id: &'static str,
    title: &'static str,
    goal_type: GoalType,
    goal_value: i64,
    reward_points: i64,
    min_attempts: i64,
}

const DEFAULT_TASKS: &[DefaultTask] = &[
    DefaultTask {
        id: "practice-10",
        title: "Answer 10 questions",
        goal_type: GoalType::Count,
        goal_value: 10,
        reward_points: 10,
        min_attempts: 0,
    },
    DefaultTask {
        id: "practice-50",
        title: "Answer 50 questions",
        goal_type: GoalType::Count,
        goal_value: 50,
        reward_points: 50,
        min_attempts: 0,
    },
    DefaultTask {
        id: "accuracy-80",
        title: "Reach 80% accuracy over at least 20 answers",
        goal_type: GoalType::Accuracy,
        goal_value: 80,
        reward_points: 30,
        min_attempts: 20,
    },
];

pub fn default_tasks() -> Vec<ChallengeTask> {
    DEFAULT_TASKS
        .iter()
        .map(|t| ChallengeTask {
            id: t.id.to_string(),
            title: t.title.to_string(),
            goal_type: t.goal_type,
            goal_value: t.goal_value,
            reward_points: t.reward_points,
            min_attempts: t.min_attempts,
        })
        .collect()
}

/// Installs the built-in challenge catalogue. Failures are logged; startup continues.
pub async fn seed_default_tasks(db: &Database) {
    let mut seeded = 0usize;
    for task in default_tasks() {
        match challenges::upsert_task(db.pool(), &task).await {
            Ok(()) => seeded += 1,
            Err(err) => tracing::warn!(task_id = %task.id, error = %err, "failed to seed challenge task"),
        }
    }
    tracing::info!(count = seeded, "default challenge tasks seeded");
}
