//! Span data models
//!
//! [`Span`] is the wire shape accepted at ingestion; [`SpanRow`] is the
//! stored form with the index fields derived at write time.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::utils::time::UnixNanos;

/// Span status block, OTEL-style: 0 = unset, 1 = ok, 2 = error.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpanStatus {
    #[serde(default)]
    pub code: i32,
}

pub const STATUS_UNSET: i32 = 0;
pub const STATUS_OK: i32 = 1;
pub const STATUS_ERROR: i32 = 2;

/// One observed unit of work as submitted by an ingestion client.
///
/// `attributes`, `resource` and `scope` are arbitrary nested key-value
/// maps addressed by dot-path; `events` and `links` are carried opaquely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Span {
    pub span_id: String,
    pub trace_id: String,
    pub parent_span_id: Option<String>,
    pub name: String,
    pub kind: i32,
    pub start_time_unix_nano: UnixNanos,
    pub end_time_unix_nano: UnixNanos,
    pub attributes: JsonValue,
    pub status: SpanStatus,
    pub resource: JsonValue,
    pub scope: JsonValue,
    pub events: JsonValue,
    pub links: JsonValue,
    /// Correlates spans to a run/session, independent of `trace_id`.
    pub conversation_id: Option<String>,
}

/// A stored span read back from the analytics store.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanRow {
    pub conversation_id: Option<String>,
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub name: String,
    pub kind: i32,
    pub start_time_unix_nano: UnixNanos,
    pub end_time_unix_nano: UnixNanos,
    pub status_code: i32,
    pub service_name: Option<String>,
    pub operation_name: Option<String>,
    pub instrumentation_name: Option<String>,
    pub instrumentation_version: Option<String>,
    pub model: Option<String>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub attributes: JsonValue,
    pub resource: JsonValue,
    pub scope: JsonValue,
    pub events: JsonValue,
    pub links: JsonValue,
}

impl SpanRow {
    /// A span with no parent within its trace.
    pub fn is_root(&self) -> bool {
        self.parent_span_id.as_deref().is_none_or(str::is_empty)
    }
}
