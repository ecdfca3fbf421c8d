pub mod challenge;
pub mod ledger;
pub mod mastery;
pub mod notification;
pub mod notification_rules;
pub mod question_selector;
pub mod study_plan;
pub mod weak_points;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("challenge {task_id} is not completed yet")]
    NotCompleted { task_id: String },
    #[error("challenge {task_id} was already claimed")]
    AlreadyClaimed { task_id: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

/// Trims a required text field, failing with a validation error naming the field.
pub(crate) fn require_field(value: &str, field: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
