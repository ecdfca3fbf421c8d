use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::operations::{notifications, DispatchKey, NotificationRecord};
use crate::db::Database;
use crate::services::{require_field, ServiceError};

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    AssignmentDue,
    AssignmentOverdue,
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssignmentDue => "assignment_due",
            Self::AssignmentOverdue => "assignment_overdue",
            Self::System => "system",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateNotificationInput {
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub notification_type: NotificationType,
}

fn build_record(input: CreateNotificationInput) -> Result<NotificationRecord, ServiceError> {
    Ok(NotificationRecord {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: require_field(&input.user_id, "userId")?,
        title: input.title,
        content: input.content,
        notification_type: input.notification_type.as_str().to_string(),
        is_read: false,
        created_at: Utc::now(),
    })
}

pub async fn create_notification(
    db: &Database,
    input: CreateNotificationInput,
) -> Result<NotificationRecord, ServiceError> {
    let record = build_record(input)?;
    notifications::insert_notification(db.pool(), &record).await?;
    Ok(record)
}

/// Delivers at most once per dispatch key. `None` means the key was already used.
pub async fn create_notification_once(
    db: &Database,
    key: &DispatchKey<'_>,
    input: CreateNotificationInput,
) -> Result<Option<NotificationRecord>, ServiceError> {
    let record = build_record(input)?;
    if notifications::insert_notification_once(db.pool(), key, &record).await? {
        Ok(Some(record))
    } else {
        Ok(None)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: Option<bool>,
    #[serde(default)]
    pub limit: Option<i64>,
}

pub async fn list_notifications(
    db: &Database,
    user_id: &str,
    query: &NotificationQuery,
) -> Result<Vec<NotificationRecord>, ServiceError> {
    let user_id = require_field(user_id, "userId")?;
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    Ok(notifications::list_notifications(db.pool(), &user_id, query.unread_only.unwrap_or(false), limit).await?)
}

pub async fn mark_read(db: &Database, user_id: &str, id: &str) -> Result<(), ServiceError> {
    let user_id = require_field(user_id, "userId")?;
    if !notifications::mark_read(db.pool(), &user_id, id).await? {
        return Err(ServiceError::not_found("notification not found"));
    }
    Ok(())
}
