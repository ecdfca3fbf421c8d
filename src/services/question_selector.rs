use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::db::operations::{attempts, content, Question, QuestionFilter};
use crate::db::Database;
use crate::services::{require_field, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PracticeMode {
    #[default]
    Normal,
    /// Review: only questions the user has answered incorrectly before.
    Wrong,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextQuestionInput {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub knowledge_point_id: Option<String>,
    #[serde(default)]
    pub mode: Option<PracticeMode>,
}

/// Uniform draw over the candidate pool.
pub fn pick<'a, R: Rng + ?Sized>(pool: &'a [Question], rng: &mut R) -> Option<&'a Question> {
    pool.choose(rng)
}

/// Draws up to `size` distinct questions from the pool.
pub fn sample<R: Rng + ?Sized>(pool: &[Question], size: usize, rng: &mut R) -> Vec<Question> {
    pool.choose_multiple(rng, size).cloned().collect()
}

pub async fn candidate_pool(
    db: &Database,
    input: &NextQuestionInput,
) -> Result<Vec<Question>, ServiceError> {
    let user_id = require_field(&input.user_id, "userId")?;
    let subject = require_field(&input.subject, "subject")?;
    let grade = require_field(&input.grade, "grade")?;
    let knowledge_point_id = input
        .knowledge_point_id
        .as_deref()
        .map(str::trim)
        .filter(|kp| !kp.is_empty());

    let wrong_ids = match input.mode.unwrap_or_default() {
        PracticeMode::Normal => None,
        PracticeMode::Wrong => Some(attempts::list_incorrect_question_ids(db.pool(), &user_id).await?),
    };

    let filter = QuestionFilter {
        subject: &subject,
        grade: &grade,
        knowledge_point_id,
        ids: wrong_ids.as_deref(),
    };

    Ok(content::list_active_questions(db.pool(), &filter).await?)
}

pub async fn next<R: Rng + ?Sized>(
    db: &Database,
    input: &NextQuestionInput,
    rng: &mut R,
) -> Result<Question, ServiceError> {
    let pool = candidate_pool(db, input).await?;

    let Some(question) = pick(&pool, rng) else {
        tracing::debug!(
            user_id = %input.user_id,
            subject = %input.subject,
            mode = ?input.mode.unwrap_or_default(),
            "no questions in pool"
        );
        return Err(ServiceError::not_found("no questions"));
    };

    Ok(question.clone())
}

/// Fixed-size diagnostic batch from the normal pool, without repeats inside the batch.
pub async fn diagnostic<R: Rng + ?Sized>(
    db: &Database,
    input: &NextQuestionInput,
    size: usize,
    rng: &mut R,
) -> Result<Vec<Question>, ServiceError> {
    let normal = NextQuestionInput {
        mode: Some(PracticeMode::Normal),
        ..input.clone()
    };
    let pool = candidate_pool(db, &normal).await?;
    if pool.is_empty() {
        return Err(ServiceError::not_found("no questions"));
    }

    Ok(sample(&pool, size, rng))
}
