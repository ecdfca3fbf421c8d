use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    Count,
    Accuracy,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Accuracy => "accuracy",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "accuracy" => Self::Accuracy,
            _ => Self::Count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeTask {
    pub id: String,
    pub title: String,
    pub goal_type: GoalType,
    pub goal_value: i64,
    pub reward_points: i64,
    /// Accuracy tasks only count once this many attempts exist.
    #[serde(default)]
    pub min_attempts: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeProgress {
    pub user_id: String,
    pub task_id: String,
    pub progress_value: i64,
    pub completed: bool,
    pub claimed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub claimed_at: Option<DateTime<Utc>>,
}

/// Outcome of the conditional claim write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimWrite {
    Credited { balance: i64 },
    Unchanged,
}

fn map_task(row: &SqliteRow) -> Result<ChallengeTask, sqlx::Error> {
    let goal_type: String = row.try_get("goalType")?;
    Ok(ChallengeTask {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        goal_type: GoalType::parse(&goal_type),
        goal_value: row.try_get("goalValue")?,
        reward_points: row.try_get("rewardPoints")?,
        min_attempts: row.try_get("minAttempts")?,
    })
}

fn map_progress(row: &SqliteRow) -> Result<ChallengeProgress, sqlx::Error> {
    Ok(ChallengeProgress {
        user_id: row.try_get("userId")?,
        task_id: row.try_get("taskId")?,
        progress_value: row.try_get("progressValue")?,
        completed: row.try_get("completed")?,
        claimed: row.try_get("claimed")?,
        completed_at: row.try_get("completedAt")?,
        claimed_at: row.try_get("claimedAt")?,
    })
}

pub async fn upsert_task(pool: &SqlitePool, task: &ChallengeTask) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO "challenge_tasks" ("id","title","goalType","goalValue","rewardPoints","minAttempts") VALUES (?,?,?,?,?,?)
           ON CONFLICT("id") DO UPDATE SET
             "title" = excluded."title",
             "goalType" = excluded."goalType",
             "goalValue" = excluded."goalValue",
             "rewardPoints" = excluded."rewardPoints",
             "minAttempts" = excluded."minAttempts""#,
    )
    .bind(&task.id)
    .bind(&task.title)
    .bind(task.goal_type.as_str())
    .bind(task.goal_value)
    .bind(task.reward_points)
    .bind(task.min_attempts)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_tasks(pool: &SqlitePool) -> Result<Vec<ChallengeTask>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT "id","title","goalType","goalValue","rewardPoints","minAttempts" FROM "challenge_tasks" ORDER BY "id""#,
    )
    .fetch_all(pool)
    .await?;
    rows.iter().map(map_task).collect()
}

pub async fn get_task(pool: &SqlitePool, task_id: &str) -> Result<Option<ChallengeTask>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT "id","title","goalType","goalValue","rewardPoints","minAttempts" FROM "challenge_tasks" WHERE "id" = ?"#,
    )
    .bind(task_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(map_task).transpose()
}

pub async fn get_progress(
    pool: &SqlitePool,
    user_id: &str,
    task_id: &str,
) -> Result<Option<ChallengeProgress>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT "userId","taskId","progressValue","completed","claimed","completedAt","claimedAt"
           FROM "challenge_progress" WHERE "userId" = ? AND "taskId" = ?"#,
    )
    .bind(user_id)
    .bind(task_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(map_progress).transpose()
}

pub async fn list_progress(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<ChallengeProgress>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT "userId","taskId","progressValue","completed","claimed","completedAt","claimedAt"
           FROM "challenge_progress" WHERE "userId" = ?"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(map_progress).collect()
}

/// Raises the stored counter to `value` if higher. `completed` and `completedAt` are sticky.
pub async fn raise_progress(
    pool: &SqlitePool,
    user_id: &str,
    task: &ChallengeTask,
    value: i64,
    now: DateTime<Utc>,
) -> Result<ChallengeProgress, sqlx::Error> {
    let reached = value >= task.goal_value;
    let completed_at = reached.then_some(now);

    let row = sqlx::query(
        r#"INSERT INTO "challenge_progress" ("userId","taskId","progressValue","completed","claimed","completedAt")
           VALUES (?,?,?,?,0,?)
           ON CONFLICT("userId","taskId") DO UPDATE SET
             "progressValue" = max("progressValue", excluded."progressValue"),
             "completed" = max("completed", excluded."completed"),
             "completedAt" = COALESCE("completedAt", excluded."completedAt")
           RETURNING "userId","taskId","progressValue","completed","claimed","completedAt","claimedAt""#,
    )
    .bind(user_id)
    .bind(&task.id)
    .bind(value)
    .bind(reached)
    .bind(completed_at)
    .fetch_one(pool)
    .await?;

    map_progress(&row)
}

/// Flips `claimed` and credits the reward in one transaction. The update only matches a
/// completed, unclaimed row, so at most one caller ever gets `Credited`.
pub async fn claim_reward(
    pool: &SqlitePool,
    user_id: &str,
    task_id: &str,
    reward_points: i64,
    now: DateTime<Utc>,
) -> Result<ClaimWrite, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"UPDATE "challenge_progress" SET "claimed" = 1, "claimedAt" = ?
           WHERE "userId" = ? AND "taskId" = ? AND "completed" = 1 AND "claimed" = 0"#,
    )
    .bind(now)
    .bind(user_id)
    .bind(task_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated != 1 {
        tx.rollback().await?;
        return Ok(ClaimWrite::Unchanged);
    }

    let balance: i64 = sqlx::query_scalar(
        r#"INSERT INTO "user_points" ("userId","balance","updatedAt") VALUES (?,?,?)
           ON CONFLICT("userId") DO UPDATE SET "balance" = "balance" + excluded."balance", "updatedAt" = excluded."updatedAt"
           RETURNING "balance""#,
    )
    .bind(user_id)
    .bind(reward_points)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(ClaimWrite::Credited { balance })
}

pub async fn points_balance(pool: &SqlitePool, user_id: &str) -> Result<i64, sqlx::Error> {
    let balance: Option<i64> =
        sqlx::query_scalar(r#"SELECT "balance" FROM "user_points" WHERE "userId" = ?"#)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(balance.unwrap_or(0))
}
