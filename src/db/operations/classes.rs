use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub id: String,
    pub teacher_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub class_id: String,
    pub title: String,
    pub due_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRule {
    pub enabled: bool,
    pub due_days: i64,
    pub overdue_days: i64,
    pub include_parents: bool,
}

impl Default for StoredRule {
    /// Effective rule for a class that never configured one. `overdue_days = 0` means overdue
    /// reminders are not bounded in time.
    fn default() -> Self {
        Self {
            enabled: true,
            due_days: 2,
            overdue_days: 0,
            include_parents: true,
        }
    }
}

pub async fn upsert_class(pool: &SqlitePool, class: &ClassRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO "classes" ("id","teacherId","name") VALUES (?,?,?)
           ON CONFLICT("id") DO UPDATE SET "teacherId" = excluded."teacherId", "name" = excluded."name""#,
    )
    .bind(&class.id)
    .bind(&class.teacher_id)
    .bind(&class.name)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_class(pool: &SqlitePool, class_id: &str) -> Result<Option<ClassRecord>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT "id","teacherId","name" FROM "classes" WHERE "id" = ?"#)
        .bind(class_id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| {
        Ok(ClassRecord {
            id: r.try_get("id")?,
            teacher_id: r.try_get("teacherId")?,
            name: r.try_get("name")?,
        })
    })
    .transpose()
}

pub async fn list_classes_by_teacher(
    pool: &SqlitePool,
    teacher_id: &str,
) -> Result<Vec<ClassRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT "id","teacherId","name" FROM "classes" WHERE "teacherId" = ? ORDER BY "id""#,
    )
    .bind(teacher_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|r| {
            Ok(ClassRecord {
                id: r.try_get("id")?,
                teacher_id: r.try_get("teacherId")?,
                name: r.try_get("name")?,
            })
        })
        .collect()
}

pub async fn add_class_member(
    pool: &SqlitePool,
    class_id: &str,
    student_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(r#"INSERT OR IGNORE INTO "class_members" ("classId","studentId") VALUES (?,?)"#)
        .bind(class_id)
        .bind(student_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_class_members(
    pool: &SqlitePool,
    class_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"SELECT "studentId" FROM "class_members" WHERE "classId" = ? ORDER BY "studentId""#,
    )
    .bind(class_id)
    .fetch_all(pool)
    .await
}

pub async fn link_parent(
    pool: &SqlitePool,
    parent_id: &str,
    student_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(r#"INSERT OR IGNORE INTO "parent_links" ("parentId","studentId") VALUES (?,?)"#)
        .bind(parent_id)
        .bind(student_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Parent ids keyed by student id.
pub async fn list_parents_of(
    pool: &SqlitePool,
    student_ids: &[String],
) -> Result<HashMap<String, Vec<String>>, sqlx::Error> {
    let mut parents: HashMap<String, Vec<String>> = HashMap::new();
    if student_ids.is_empty() {
        return Ok(parents);
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        r#"SELECT "parentId","studentId" FROM "parent_links" WHERE "studentId" IN ("#,
    );
    {
        let mut sep = qb.separated(", ");
        for id in student_ids {
            sep.push_bind(id);
        }
        sep.push_unseparated(r#") ORDER BY "parentId""#);
    }

    for row in qb.build().fetch_all(pool).await? {
        let parent_id: String = row.try_get("parentId")?;
        let student_id: String = row.try_get("studentId")?;
        parents.entry(student_id).or_default().push(parent_id);
    }

    Ok(parents)
}

pub async fn upsert_assignment(pool: &SqlitePool, assignment: &Assignment) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO "assignments" ("id","classId","title","dueAt") VALUES (?,?,?,?)
           ON CONFLICT("id") DO UPDATE SET "classId" = excluded."classId", "title" = excluded."title", "dueAt" = excluded."dueAt""#,
    )
    .bind(&assignment.id)
    .bind(&assignment.class_id)
    .bind(&assignment.title)
    .bind(assignment.due_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Assignments of a class. Rows whose due date cannot be decoded come back as `Err` so the
/// caller can skip them individually.
pub async fn list_assignments(
    pool: &SqlitePool,
    class_id: &str,
) -> Result<Vec<Result<Assignment, sqlx::Error>>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT "id","classId","title","dueAt" FROM "assignments" WHERE "classId" = ? ORDER BY "id""#,
    )
    .bind(class_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|r| {
            Ok(Assignment {
                id: r.try_get("id")?,
                class_id: r.try_get("classId")?,
                title: r.try_get("title")?,
                due_at: r.try_get("dueAt")?,
            })
        })
        .collect())
}

pub async fn set_assignment_status(
    pool: &SqlitePool,
    assignment_id: &str,
    student_id: &str,
    status: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO "assignment_progress" ("assignmentId","studentId","status") VALUES (?,?,?)
           ON CONFLICT("assignmentId","studentId") DO UPDATE SET "status" = excluded."status""#,
    )
    .bind(assignment_id)
    .bind(student_id)
    .bind(status)
    .execute(pool)
    .await?;
    Ok(())
}

/// Progress status per student for one assignment. Students without a row are absent.
pub async fn assignment_statuses(
    pool: &SqlitePool,
    assignment_id: &str,
) -> Result<HashMap<String, String>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT "studentId","status" FROM "assignment_progress" WHERE "assignmentId" = ?"#,
    )
    .bind(assignment_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|r| Ok((r.try_get::<String, _>("studentId")?, r.try_get::<String, _>("status")?)))
        .collect()
}

pub async fn get_notification_rule(
    pool: &SqlitePool,
    class_id: &str,
) -> Result<Option<StoredRule>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT "enabled","dueDays","overdueDays","includeParents" FROM "class_notification_rules" WHERE "classId" = ?"#,
    )
    .bind(class_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| {
        Ok(StoredRule {
            enabled: r.try_get("enabled")?,
            due_days: r.try_get("dueDays")?,
            overdue_days: r.try_get("overdueDays")?,
            include_parents: r.try_get("includeParents")?,
        })
    })
    .transpose()
}

pub async fn upsert_notification_rule(
    pool: &SqlitePool,
    class_id: &str,
    rule: &StoredRule,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO "class_notification_rules" ("classId","enabled","dueDays","overdueDays","includeParents","updatedAt")
           VALUES (?,?,?,?,?,?)
           ON CONFLICT("classId") DO UPDATE SET
             "enabled" = excluded."enabled",
             "dueDays" = excluded."dueDays",
             "overdueDays" = excluded."overdueDays",
             "includeParents" = excluded."includeParents",
             "updatedAt" = excluded."updatedAt""#,
    )
    .bind(class_id)
    .bind(rule.enabled)
    .bind(rule.due_days)
    .bind(rule.overdue_days)
    .bind(rule.include_parents)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}
