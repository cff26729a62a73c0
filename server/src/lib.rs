//! Wordsync Server - reference sync authority for local-first clients.
//!
//! This server persists pushed records for any collection, stamps them with
//! a monotonic server clock and serves incremental pulls. Clients drive it
//! with the wordsync-engine batcher and merge what they pull with the
//! engine's reconciler.
//!
//! Storage is in memory; the server is meant for development and tests.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod store;

pub use crate::config::Config;
pub use crate::store::RecordStore;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// State with an empty store.
    pub fn new(config: Config) -> Self {
        Self {
            store: RecordStore::new_shared(),
            config: Arc::new(config),
        }
    }
}

/// Build the application router.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
