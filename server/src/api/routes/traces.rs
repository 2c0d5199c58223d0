//! Trace query endpoints

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::api::types::{ApiError, parse_nanos_param};
use crate::data::duckdb::{DuckdbService, stats_repository, trace_repository};
use crate::data::types::table::{TableData, TableRequestParams};
use crate::data::types::trace::{StatisticsFilter, TraceDetail, TraceStatistics, TraceSummary};
use crate::domain::aggregate::descendant_stats;
use crate::domain::tree::{TraceNode, build_tree};

/// Paginated, filtered, sorted trace listing.
pub async fn query_traces(
    State(state): State<ApiState>,
    Json(request): Json<TableRequestParams>,
) -> Result<Json<TableData<TraceSummary>>, ApiError> {
    let db = state.db.clone();
    let page = DuckdbService::run_query(move || {
        let conn = db.conn();
        trace_repository::list_traces(&conn, &request)
    })
    .await
    .map_err(ApiError::from_duckdb)?
    .map_err(ApiError::from_duckdb)?;

    Ok(Json(page))
}

/// Full detail of one trace.
pub async fn get_trace(
    State(state): State<ApiState>,
    Path(trace_id): Path<String>,
) -> Result<Json<TraceDetail>, ApiError> {
    let db = state.db.clone();
    let id = trace_id.clone();
    let detail = DuckdbService::run_query(move || {
        let conn = db.conn();
        trace_repository::get_trace(&conn, &id)
    })
    .await
    .map_err(ApiError::from_duckdb)?
    .map_err(ApiError::from_duckdb)?;

    detail.map(Json).ok_or_else(|| {
        ApiError::not_found("TRACE_NOT_FOUND", format!("Trace not found: {}", trace_id))
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceTreeRoot {
    pub span_count: u64,
    pub total_tokens: Option<i64>,
    #[serde(flatten)]
    pub node: TraceNode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceTreeResponse {
    pub trace_id: String,
    pub roots: Vec<TraceTreeRoot>,
}

/// Span forest of one trace, with per-root aggregates.
pub async fn get_trace_tree(
    State(state): State<ApiState>,
    Path(trace_id): Path<String>,
) -> Result<Json<TraceTreeResponse>, ApiError> {
    let db = state.db.clone();
    let id = trace_id.clone();
    let detail = DuckdbService::run_query(move || {
        let conn = db.conn();
        trace_repository::get_trace(&conn, &id)
    })
    .await
    .map_err(ApiError::from_duckdb)?
    .map_err(ApiError::from_duckdb)?;

    let Some(detail) = detail else {
        return Err(ApiError::not_found(
            "TRACE_NOT_FOUND",
            format!("Trace not found: {}", trace_id),
        ));
    };

    let roots = build_tree(detail.spans.clone())
        .into_iter()
        .map(|node| {
            let stats = descendant_stats(&detail.spans, &node.span.span_id);
            TraceTreeRoot {
                span_count: stats.span_count,
                total_tokens: stats.total_tokens,
                node,
            }
        })
        .collect();

    Ok(Json(TraceTreeResponse {
        trace_id: detail.trace_id,
        roots,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatisticsQuery {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub service_name: Option<String>,
    pub operation_name: Option<String>,
}

/// Store-wide trace statistics, optionally constrained.
pub async fn get_statistics(
    State(state): State<ApiState>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<TraceStatistics>, ApiError> {
    let filter = StatisticsFilter {
        start_time: parse_nanos_param(&query.start_time)?,
        end_time: parse_nanos_param(&query.end_time)?,
        service_name: query.service_name,
        operation_name: query.operation_name,
    };

    let db = state.db.clone();
    let stats = DuckdbService::run_query(move || {
        let conn = db.conn();
        stats_repository::get_statistics(&conn, &filter)
    })
    .await
    .map_err(ApiError::from_duckdb)?
    .map_err(ApiError::from_duckdb)?;

    Ok(Json(stats))
}
