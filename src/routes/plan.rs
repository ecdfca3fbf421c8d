use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;

use crate::auth::require_user_id;
use crate::response::{ok, AppError};
use crate::services::study_plan;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:subject", get(get_plan))
        .route("/:subject/refresh", post(refresh_plan))
}

async fn get_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(subject): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = require_user_id(&headers)?;
    let plan = study_plan::get_or_generate(state.db(), state.engine(), &user_id, &subject).await?;
    Ok(ok(plan))
}

async fn refresh_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(subject): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = require_user_id(&headers)?;
    let plan = study_plan::refresh(state.db(), state.engine(), &user_id, &subject).await?;
    Ok(ok(plan))
}
