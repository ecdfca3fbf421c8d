use chrono::Utc;
use serde::Deserialize;

use crate::db::operations::{attempts, content, Attempt, AttemptSource};
use crate::db::Database;
use crate::services::{require_field, ServiceError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAttemptInput {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub question_id: String,
    #[serde(default)]
    pub knowledge_point_id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub correct: bool,
    #[serde(default)]
    pub answer_given: Option<String>,
    #[serde(default)]
    pub source: Option<AttemptSource>,
}

/// Appends one attempt to the ledger. Attempts are never updated or deleted; a correction is
/// simply a newer attempt.
pub async fn record(db: &Database, input: RecordAttemptInput) -> Result<Attempt, ServiceError> {
    let user_id = require_field(&input.user_id, "userId")?;
    let question_id = require_field(&input.question_id, "questionId")?;
    let knowledge_point_id = require_field(&input.knowledge_point_id, "knowledgePointId")?;

    let subject = match input.subject.as_deref().map(str::trim) {
        Some(subject) if !subject.is_empty() => subject.to_string(),
        _ => content::get_question(db.pool(), &question_id)
            .await?
            .map(|q| q.subject)
            .unwrap_or_default(),
    };

    let attempt = Attempt {
        id: uuid::Uuid::new_v4().to_string(),
        user_id,
        question_id,
        subject,
        knowledge_point_id,
        correct: input.correct,
        answer_given: input.answer_given.unwrap_or_default(),
        source: input.source.unwrap_or_default(),
        created_at: Utc::now(),
    };

    attempts::insert_attempt(db.pool(), &attempt).await?;

    tracing::debug!(
        user_id = %attempt.user_id,
        question_id = %attempt.question_id,
        correct = attempt.correct,
        source = attempt.source.as_str(),
        "attempt recorded"
    );

    Ok(attempt)
}

pub async fn list_by_user(db: &Database, user_id: &str) -> Result<Vec<Attempt>, ServiceError> {
    Ok(attempts::list_attempts_by_user(db.pool(), user_id).await?)
}

pub async fn list_by_users(db: &Database, user_ids: &[String]) -> Result<Vec<Attempt>, ServiceError> {
    Ok(attempts::list_attempts_by_users(db.pool(), user_ids).await?)
}
