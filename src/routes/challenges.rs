use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;

use crate::auth::require_user_id;
use crate::response::{ok, AppError};
use crate::services::challenge;
use crate::state::AppState;

#[derive(Serialize)]
struct PointsResponse {
    balance: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_challenges))
        .route("/points", get(get_points))
        .route("/:task_id/claim", post(claim_challenge))
}

async fn list_challenges(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let user_id = require_user_id(&headers)?;
    challenge::sync_progress(state.db(), &user_id).await?;
    Ok(ok(challenge::list_progress(state.db(), &user_id).await?))
}

async fn claim_challenge(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = require_user_id(&headers)?;
    let outcome = challenge::claim(state.db(), &user_id, &task_id).await?;
    Ok(ok(outcome))
}

async fn get_points(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let user_id = require_user_id(&headers)?;
    let balance = challenge::points_balance(state.db(), &user_id).await?;
    Ok(ok(PointsResponse { balance }))
}
