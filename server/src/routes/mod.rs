//! Route tables.

mod health;
mod sync;

use axum::{http::StatusCode, Router};

use crate::AppState;

/// All routes, with a plain 404 for anything else.
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(sync::routes())
        .fallback(not_found)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "no such route")
}
