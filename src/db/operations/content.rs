use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgePoint {
    pub id: String,
    pub subject: String,
    #[serde(default)]
    pub grade: Option<String>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub subject: String,
    pub grade: String,
    pub knowledge_point_id: String,
    pub stem: String,
    #[serde(default, skip_serializing)]
    pub answer: String,
    pub active: bool,
}

/// Filters shared by every question-pool lookup.
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter<'a> {
    pub subject: &'a str,
    pub grade: &'a str,
    pub knowledge_point_id: Option<&'a str>,
    pub ids: Option<&'a [String]>,
}

fn map_question(row: &SqliteRow) -> Result<Question, sqlx::Error> {
    Ok(Question {
        id: row.try_get("id")?,
        subject: row.try_get("subject")?,
        grade: row.try_get("grade")?,
        knowledge_point_id: row.try_get("knowledgePointId")?,
        stem: row.try_get("stem")?,
        answer: row.try_get("answer")?,
        active: row.try_get("active")?,
    })
}

pub async fn upsert_knowledge_point(
    pool: &SqlitePool,
    point: &KnowledgePoint,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO "knowledge_points" ("id","subject","grade","title") VALUES (?,?,?,?)
           ON CONFLICT("id") DO UPDATE SET "subject" = excluded."subject", "grade" = excluded."grade", "title" = excluded."title""#,
    )
    .bind(&point.id)
    .bind(&point.subject)
    .bind(&point.grade)
    .bind(&point.title)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_knowledge_points(
    pool: &SqlitePool,
    subject: Option<&str>,
) -> Result<Vec<KnowledgePoint>, sqlx::Error> {
    let rows = match subject {
        Some(subject) => {
            sqlx::query(
                r#"SELECT "id","subject","grade","title" FROM "knowledge_points" WHERE "subject" = ? ORDER BY "title""#,
            )
            .bind(subject)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                r#"SELECT "id","subject","grade","title" FROM "knowledge_points" ORDER BY "subject","title""#,
            )
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter()
        .map(|row| {
            Ok(KnowledgePoint {
                id: row.try_get("id")?,
                subject: row.try_get("subject")?,
                grade: row.try_get("grade")?,
                title: row.try_get("title")?,
            })
        })
        .collect()
}

pub async fn upsert_question(pool: &SqlitePool, question: &Question) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO "questions" ("id","subject","grade","knowledgePointId","stem","answer","active") VALUES (?,?,?,?,?,?,?)
           ON CONFLICT("id") DO UPDATE SET
             "subject" = excluded."subject",
             "grade" = excluded."grade",
             "knowledgePointId" = excluded."knowledgePointId",
             "stem" = excluded."stem",
             "answer" = excluded."answer",
             "active" = excluded."active""#,
    )
    .bind(&question.id)
    .bind(&question.subject)
    .bind(&question.grade)
    .bind(&question.knowledge_point_id)
    .bind(&question.stem)
    .bind(&question.answer)
    .bind(question.active)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_question(pool: &SqlitePool, id: &str) -> Result<Option<Question>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT "id","subject","grade","knowledgePointId","stem","answer","active" FROM "questions" WHERE "id" = ?"#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(map_question).transpose()
}

/// Active questions matching the filter, ordered by id so pools are stable for seeded draws.
pub async fn list_active_questions(
    pool: &SqlitePool,
    filter: &QuestionFilter<'_>,
) -> Result<Vec<Question>, sqlx::Error> {
    if matches!(filter.ids, Some(ids) if ids.is_empty()) {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        r#"SELECT "id","subject","grade","knowledgePointId","stem","answer","active" FROM "questions" WHERE "active" = 1 AND "subject" = "#,
    );
    qb.push_bind(filter.subject);
    qb.push(r#" AND "grade" = "#);
    qb.push_bind(filter.grade);

    if let Some(kp) = filter.knowledge_point_id {
        qb.push(r#" AND "knowledgePointId" = "#);
        qb.push_bind(kp);
    }

    if let Some(ids) = filter.ids {
        qb.push(r#" AND "id" IN ("#);
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(id);
        }
        sep.push_unseparated(")");
    }

    qb.push(r#" ORDER BY "id""#);

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(map_question).collect()
}
