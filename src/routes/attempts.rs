use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::auth::require_user_id;
use crate::response::{ok, AppError};
use crate::services::challenge;
use crate::services::ledger::{self, RecordAttemptInput};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_attempts).post(record_attempt))
}

async fn record_attempt(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut input): Json<RecordAttemptInput>,
) -> Result<impl IntoResponse, AppError> {
    input.user_id = require_user_id(&headers)?;
    let attempt = ledger::record(state.db(), input).await?;

    // The attempt is already durable; stale challenge counters catch up on the next sync.
    if let Err(err) = challenge::sync_progress(state.db(), &attempt.user_id).await {
        tracing::warn!(user_id = %attempt.user_id, error = %err, "challenge sync after attempt failed");
    }

    Ok((StatusCode::CREATED, ok(attempt)))
}

async fn list_attempts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let user_id = require_user_id(&headers)?;
    let attempts = ledger::list_by_user(state.db(), &user_id).await?;
    Ok(ok(attempts))
}
