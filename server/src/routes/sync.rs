//! Sync endpoint routes.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};

use crate::error::Result;
use crate::handlers::{
    handle_pull, handle_push, PullQuery, PullResponse, PushRequest, PushResponse,
};
use crate::AppState;

/// Create sync routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync/{collection}/push", post(push_handler))
        .route("/sync/{collection}/pull", get(pull_handler))
}

/// POST /sync/{collection}/push - Persist one chunk of records.
async fn push_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(request): Json<PushRequest>,
) -> Result<Json<PushResponse>> {
    let response = handle_push(
        &state.store,
        state.config.max_push_records,
        &collection,
        request,
    )?;
    Ok(Json(response))
}

/// GET /sync/{collection}/pull - Records changed since a watermark.
async fn pull_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<PullQuery>,
) -> Result<Json<PullResponse>> {
    let response = handle_pull(&state.store, &collection, query)?;
    Ok(Json(response))
}
