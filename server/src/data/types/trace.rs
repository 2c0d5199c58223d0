//! Trace-level response shapes

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::types::span::SpanRow;
use crate::utils::time::UnixNanos;

/// One row in the trace listing: the representative span of a trace (or
/// orphan subtree) plus aggregates over its descendant closure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSummary {
    pub trace_id: String,
    pub span_id: String,
    pub name: String,
    pub start_time: UnixNanos,
    pub end_time: UnixNanos,
    /// Representative span duration in seconds.
    pub duration: f64,
    pub status: i32,
    /// Spans in the closure, the representative included.
    pub span_count: u64,
    /// Sum over descendants that report tokens; `None` when none do.
    pub total_tokens: Option<i64>,
    /// True when the representative's parent is missing from the store.
    pub is_orphan: bool,
}

/// A full trace: every stored span plus trace-wide aggregates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceDetail {
    pub trace_id: String,
    pub spans: Vec<SpanRow>,
    pub start_time: UnixNanos,
    pub end_time: UnixNanos,
    /// Wall-clock extent of the trace in seconds (max end - min start).
    pub duration: f64,
    pub status: i32,
    pub total_tokens: Option<i64>,
}

/// Optional constraints on the statistics rollup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatisticsFilter {
    pub start_time: Option<UnixNanos>,
    pub end_time: Option<UnixNanos>,
    pub service_name: Option<String>,
    pub operation_name: Option<String>,
}

/// Store-wide trace statistics.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStatistics {
    pub total_traces: u64,
    pub total_spans: u64,
    pub error_traces: u64,
    /// Mean of per-trace wall-clock extents, in seconds. 0 when no traces match.
    pub avg_duration: f64,
    pub total_tokens: i64,
    /// Distinct trace count per span status code observed.
    pub traces_by_status: BTreeMap<i32, u64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTotals {
    pub input: i64,
    pub output: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAverages {
    pub input: f64,
    pub output: f64,
    pub total: f64,
}

/// Per-model slice of the invocation rollup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInvocationGroup {
    pub model: String,
    pub invocations: u64,
    /// Invocations that reported token usage.
    pub chat_invocations: u64,
    pub tokens: TokenTotals,
    pub average_tokens: TokenAverages,
}

/// Model-invocation rollup for one conversation.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInvocationData {
    pub total_invocations: u64,
    pub chat_invocations: u64,
    pub tokens: TokenTotals,
    pub average_tokens: TokenAverages,
    pub by_model: Vec<ModelInvocationGroup>,
}
