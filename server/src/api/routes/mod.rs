//! API route handlers

pub mod conversations;
pub mod health;
pub mod spans;
pub mod traces;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::data::duckdb::DuckdbService;

/// Shared state for all API routes
#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<DuckdbService>,
}

/// Assemble the API router.
pub fn routes(db: Arc<DuckdbService>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/spans",
            post(spans::ingest_spans).delete(spans::delete_spans),
        )
        .route("/api/traces/query", post(traces::query_traces))
        .route("/api/traces/statistics", get(traces::get_statistics))
        .route("/api/traces/{trace_id}", get(traces::get_trace))
        .route("/api/traces/{trace_id}/tree", get(traces::get_trace_tree))
        .route(
            "/api/conversations/{conversation_id}/model-invocations",
            get(conversations::get_model_invocations),
        )
        .with_state(ApiState { db })
}
