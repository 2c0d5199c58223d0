//! Span ingestion and deletion endpoints

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::api::types::ApiError;
use crate::data::duckdb::{DuckdbService, span_repository};
use crate::data::types::span::Span;
use crate::domain::extract::to_span_row;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub spans: Vec<Span>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub inserted: usize,
}

/// Ingest a batch of spans.
pub async fn ingest_spans(
    State(state): State<ApiState>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    let rows: Vec<_> = request.spans.into_iter().map(to_span_row).collect();
    let inserted = rows.len();

    let db = state.db.clone();
    DuckdbService::run_query(move || {
        let conn = db.conn();
        span_repository::insert_batch(&conn, &rows)
    })
    .await
    .map_err(ApiError::from_duckdb)?
    .map_err(ApiError::from_duckdb)?;

    tracing::debug!(count = inserted, "Spans ingested");
    Ok(Json(IngestResponse { inserted }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSpansRequest {
    pub conversation_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSpansResponse {
    pub deleted: usize,
}

/// Delete all spans of the given conversations.
pub async fn delete_spans(
    State(state): State<ApiState>,
    Json(request): Json<DeleteSpansRequest>,
) -> Result<Json<DeleteSpansResponse>, ApiError> {
    let db = state.db.clone();
    let deleted = DuckdbService::run_query(move || {
        let conn = db.conn();
        span_repository::delete_by_conversations(&conn, &request.conversation_ids)
    })
    .await
    .map_err(ApiError::from_duckdb)?
    .map_err(ApiError::from_duckdb)?;

    tracing::debug!(deleted, "Spans deleted");
    Ok(Json(DeleteSpansResponse { deleted }))
}
