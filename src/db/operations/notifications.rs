use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

fn map_notification(row: &SqliteRow) -> Result<NotificationRecord, sqlx::Error> {
    Ok(NotificationRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("userId")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        notification_type: row.try_get("type")?,
        is_read: row.try_get("isRead")?,
        created_at: row.try_get("createdAt")?,
    })
}

pub async fn insert_notification(
    pool: &SqlitePool,
    record: &NotificationRecord,
) -> Result<(), sqlx::Error> {
    insert_row(pool, record).await
}

async fn insert_row<'e, E>(executor: E, record: &NotificationRecord) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"INSERT INTO "notifications" ("id","userId","title","content","type","isRead","createdAt") VALUES (?,?,?,?,?,?,?)"#,
    )
    .bind(&record.id)
    .bind(&record.user_id)
    .bind(&record.title)
    .bind(&record.content)
    .bind(&record.notification_type)
    .bind(record.is_read)
    .bind(record.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list_notifications(
    pool: &SqlitePool,
    user_id: &str,
    unread_only: bool,
    limit: i64,
) -> Result<Vec<NotificationRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT "id","userId","title","content","type","isRead","createdAt" FROM "notifications"
           WHERE "userId" = ? AND (? = 0 OR "isRead" = 0)
           ORDER BY "createdAt" DESC, "id" LIMIT ?"#,
    )
    .bind(user_id)
    .bind(unread_only)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.iter().map(map_notification).collect()
}

pub async fn mark_read(pool: &SqlitePool, user_id: &str, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"UPDATE "notifications" SET "isRead" = 1 WHERE "id" = ? AND "userId" = ?"#)
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// One reminder slot: a recipient hears about one student's assignment once per trigger window.
#[derive(Debug, Clone, Copy)]
pub struct DispatchKey<'a> {
    pub assignment_id: &'a str,
    pub student_id: &'a str,
    pub recipient_id: &'a str,
    pub trigger: &'a str,
    pub window_bucket: i64,
}

/// Claims the dispatch key and stores the notification in one transaction. Returns `false`
/// when the key was already taken; nothing is written then. A failed insert leaves the key free.
pub async fn insert_notification_once(
    pool: &SqlitePool,
    key: &DispatchKey<'_>,
    record: &NotificationRecord,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let reserved = sqlx::query(
        r#"INSERT OR IGNORE INTO "notification_dispatches" ("assignmentId","studentId","recipientId","trigger","windowBucket","createdAt")
           VALUES (?,?,?,?,?,?)"#,
    )
    .bind(key.assignment_id)
    .bind(key.student_id)
    .bind(key.recipient_id)
    .bind(key.trigger)
    .bind(key.window_bucket)
    .bind(record.created_at)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if reserved != 1 {
        tx.rollback().await?;
        return Ok(false);
    }

    if let Err(e) = insert_row(&mut *tx, record).await {
        tx.rollback().await?;
        return Err(e);
    }

    tx.commit().await?;
    Ok(true)
}
