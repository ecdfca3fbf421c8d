use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttemptSource {
    #[default]
    Practice,
    Diagnostic,
    Assignment,
}

impl AttemptSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::Diagnostic => "diagnostic",
            Self::Assignment => "assignment",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "diagnostic" => Self::Diagnostic,
            "assignment" => Self::Assignment,
            _ => Self::Practice,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: String,
    pub user_id: String,
    pub question_id: String,
    pub subject: String,
    pub knowledge_point_id: String,
    pub correct: bool,
    pub answer_given: String,
    pub source: AttemptSource,
    pub created_at: DateTime<Utc>,
}

const ATTEMPT_COLUMNS: &str = r#""id","userId","questionId","subject","knowledgePointId","correct","answerGiven","source","createdAt""#;

fn map_attempt(row: &SqliteRow) -> Result<Attempt, sqlx::Error> {
    let source: String = row.try_get("source")?;
    Ok(Attempt {
        id: row.try_get("id")?,
        user_id: row.try_get("userId")?,
        question_id: row.try_get("questionId")?,
        subject: row.try_get("subject")?,
        knowledge_point_id: row.try_get("knowledgePointId")?,
        correct: row.try_get("correct")?,
        answer_given: row.try_get("answerGiven")?,
        source: AttemptSource::parse(&source),
        created_at: row.try_get("createdAt")?,
    })
}

pub async fn insert_attempt(pool: &SqlitePool, attempt: &Attempt) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO "attempts" ("id","userId","questionId","subject","knowledgePointId","correct","answerGiven","source","createdAt")
           VALUES (?,?,?,?,?,?,?,?,?)"#,
    )
    .bind(&attempt.id)
    .bind(&attempt.user_id)
    .bind(&attempt.question_id)
    .bind(&attempt.subject)
    .bind(&attempt.knowledge_point_id)
    .bind(attempt.correct)
    .bind(&attempt.answer_given)
    .bind(attempt.source.as_str())
    .bind(attempt.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_attempts_by_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<Attempt>, sqlx::Error> {
    let sql = format!(r#"SELECT {ATTEMPT_COLUMNS} FROM "attempts" WHERE "userId" = ?"#);
    let rows = sqlx::query(&sql).bind(user_id).fetch_all(pool).await?;
    rows.iter().map(map_attempt).collect()
}

pub async fn list_attempts_by_users(
    pool: &SqlitePool,
    user_ids: &[String],
) -> Result<Vec<Attempt>, sqlx::Error> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        r#"SELECT {ATTEMPT_COLUMNS} FROM "attempts" WHERE "userId" IN ("#
    ));
    {
        let mut sep = qb.separated(", ");
        for id in user_ids {
            sep.push_bind(id);
        }
        sep.push_unseparated(")");
    }

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(map_attempt).collect()
}

/// Distinct question ids the user has answered incorrectly at least once.
pub async fn list_incorrect_question_ids(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"SELECT DISTINCT "questionId" FROM "attempts" WHERE "userId" = ? AND "correct" = 0"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
