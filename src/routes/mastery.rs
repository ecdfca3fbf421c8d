use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::auth::require_user_id;
use crate::response::{ok, AppError};
use crate::services::mastery::{self, Coverage};
use crate::services::weak_points;
use crate::state::AppState;

const MAX_WEAK_POINT_LIMIT: usize = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MasteryQuery {
    subject: Option<String>,
    full: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeakPointQuery {
    subject: Option<String>,
    full: Option<bool>,
    limit: Option<usize>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_mastery))
        .route("/subjects", get(get_subjects))
        .route("/weak-points", get(get_weak_points))
}

fn coverage(full: Option<bool>) -> Coverage {
    if full.unwrap_or(false) {
        Coverage::Full
    } else {
        Coverage::Practiced
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

async fn get_mastery(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MasteryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = require_user_id(&headers)?;
    let entries =
        mastery::user_mastery(state.db(), &user_id, non_empty(&query.subject), coverage(query.full)).await?;
    Ok(ok(entries))
}

async fn get_subjects(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let user_id = require_user_id(&headers)?;
    Ok(ok(mastery::subject_summary(state.db(), &user_id).await?))
}

async fn get_weak_points(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WeakPointQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = require_user_id(&headers)?;
    let limit = query
        .limit
        .unwrap_or(state.engine().weak_point_limit)
        .clamp(1, MAX_WEAK_POINT_LIMIT);

    let ranked = weak_points::for_user(
        state.db(),
        &user_id,
        non_empty(&query.subject),
        coverage(query.full),
        limit,
    )
    .await?;
    Ok(ok(ranked))
}
