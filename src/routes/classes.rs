use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::auth::require_user_id;
use crate::response::{ok, AppError};
use crate::services::mastery;
use crate::services::notification_rules::{self, UpdateRuleInput};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct ClassMasteryQuery {
    subject: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/mastery", get(class_mastery))
        .route("/:id/notification-rule", get(get_rule).put(update_rule))
}

async fn class_mastery(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(class_id): Path<String>,
    Query(query): Query<ClassMasteryQuery>,
) -> Result<impl IntoResponse, AppError> {
    require_user_id(&headers)?;
    let subject = query
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::validation("subject is required"))?;

    let entries = mastery::class_mastery(state.db(), &class_id, subject).await?;
    Ok(ok(entries))
}

async fn get_rule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(class_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = require_user_id(&headers)?;
    let rule = notification_rules::get_rule(state.db(), &teacher_id, &class_id).await?;
    Ok(ok(rule))
}

async fn update_rule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(class_id): Path<String>,
    Json(input): Json<UpdateRuleInput>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = require_user_id(&headers)?;
    let rule = notification_rules::update_rule(state.db(), &teacher_id, &class_id, input).await?;
    Ok(ok(rule))
}
