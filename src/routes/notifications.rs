use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::auth::require_user_id;
use crate::response::{ok, AppError};
use crate::services::notification::{self, NotificationQuery};
use crate::services::notification_rules;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunQuery {
    class_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadResponse {
    id: String,
    is_read: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/run", post(run_rules))
        .route("/:id/read", put(mark_read))
}

async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NotificationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = require_user_id(&headers)?;
    let items = notification::list_notifications(state.db(), &user_id, &query).await?;
    Ok(ok(items))
}

async fn mark_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = require_user_id(&headers)?;
    notification::mark_read(state.db(), &user_id, &id).await?;
    Ok(ok(ReadResponse { id, is_read: true }))
}

async fn run_rules(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RunQuery>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = require_user_id(&headers)?;
    let report =
        notification_rules::run(state.db(), state.engine(), &teacher_id, query.class_id.as_deref()).await?;
    Ok(ok(report))
}
