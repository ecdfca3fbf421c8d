use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::auth::require_user_id;
use crate::response::{ok, AppError};
use crate::services::question_selector::{self, NextQuestionInput};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/next", get(next_question))
        .route("/diagnostic", get(diagnostic))
}

async fn next_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(mut input): Query<NextQuestionInput>,
) -> Result<impl IntoResponse, AppError> {
    input.user_id = require_user_id(&headers)?;
    let mut rng = StdRng::from_os_rng();
    let question = question_selector::next(state.db(), &input, &mut rng).await?;
    Ok(ok(question))
}

async fn diagnostic(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(mut input): Query<NextQuestionInput>,
) -> Result<impl IntoResponse, AppError> {
    input.user_id = require_user_id(&headers)?;
    let mut rng = StdRng::from_os_rng();
    let batch =
        question_selector::diagnostic(state.db(), &input, state.engine().diagnostic_size, &mut rng).await?;
    Ok(ok(batch))
}
