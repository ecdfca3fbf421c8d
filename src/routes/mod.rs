mod attempts;
mod challenges;
mod classes;
mod health;
mod mastery;
mod notifications;
mod plan;
mod practice;

use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::response::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest("/api/attempts", attempts::router())
        .nest("/api/mastery", mastery::router())
        .nest("/api/study-plans", plan::router())
        .nest("/api/practice", practice::router())
        .nest("/api/challenges", challenges::router())
        .nest("/api/notifications", notifications::router())
        .nest("/api/classes", classes::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    AppError::not_found("route not found").into_response()
}
