use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanItem {
    pub knowledge_point_id: String,
    pub title: String,
    pub priority_rank: i64,
    pub recommended_count: i64,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    pub id: String,
    pub user_id: String,
    pub subject: String,
    pub items: Vec<PlanItem>,
    pub generated_at: DateTime<Utc>,
}

pub async fn get_plan(
    pool: &SqlitePool,
    user_id: &str,
    subject: &str,
) -> Result<Option<StudyPlan>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT "id","userId","subject","items","generatedAt" FROM "study_plans" WHERE "userId" = ? AND "subject" = ?"#,
    )
    .bind(user_id)
    .bind(subject)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else { return Ok(None) };

    let items_raw: String = row.try_get("items")?;
    let items: Vec<PlanItem> = serde_json::from_str(&items_raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: "items".to_string(),
        source: Box::new(e),
    })?;

    Ok(Some(StudyPlan {
        id: row.try_get("id")?,
        user_id: row.try_get("userId")?,
        subject: row.try_get("subject")?,
        items,
        generated_at: row.try_get("generatedAt")?,
    }))
}

/// Writes the plan as the current plan for (user, subject). An existing plan keeps its id but
/// its items are replaced wholesale.
pub async fn replace_plan(pool: &SqlitePool, plan: &StudyPlan) -> Result<StudyPlan, sqlx::Error> {
    let items_json = serde_json::to_string(&plan.items).map_err(|e| sqlx::Error::Protocol(e.to_string()))?;

    let id: String = sqlx::query_scalar(
        r#"INSERT INTO "study_plans" ("id","userId","subject","items","generatedAt") VALUES (?,?,?,?,?)
           ON CONFLICT("userId","subject") DO UPDATE SET "items" = excluded."items", "generatedAt" = excluded."generatedAt"
           RETURNING "id""#,
    )
    .bind(&plan.id)
    .bind(&plan.user_id)
    .bind(&plan.subject)
    .bind(&items_json)
    .bind(plan.generated_at)
    .fetch_one(pool)
    .await?;

    Ok(StudyPlan {
        id,
        ..plan.clone()
    })
}
