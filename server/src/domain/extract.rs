//! Derived-field extraction
//!
//! Pulls the queryable index fields (service, operation, model, token
//! counts, instrumentation) out of a span's nested attribute maps at
//! ingestion time. Instrumentation conventions vary by SDK, so each field
//! probes a list of known keys in priority order.

use serde_json::Value as JsonValue;

use crate::data::types::span::{Span, SpanRow};
use crate::utils::json::{get_nested_i64, get_nested_str};

const SERVICE_NAME_KEY: &str = "service.name";

const OPERATION_KEYS: &[&str] = &["gen_ai.operation.name", "operation.name"];

const MODEL_KEYS: &[&str] = &[
    "gen_ai.request.model",
    "gen_ai.response.model",
    "llm.model_name",
];

const INPUT_TOKEN_KEYS: &[&str] = &[
    "gen_ai.usage.input_tokens",
    "gen_ai.usage.prompt_tokens",
    "llm.token_count.prompt",
];

const OUTPUT_TOKEN_KEYS: &[&str] = &[
    "gen_ai.usage.output_tokens",
    "gen_ai.usage.completion_tokens",
    "llm.token_count.completion",
];

fn first_str(value: &JsonValue, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| get_nested_str(value, k))
        .map(str::to_string)
}

fn first_i64(value: &JsonValue, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|k| get_nested_i64(value, k))
}

/// Service name: resource-level by convention, span attributes as fallback.
pub fn extract_service_name(span: &Span) -> Option<String> {
    get_nested_str(&span.resource, SERVICE_NAME_KEY)
        .or_else(|| get_nested_str(&span.attributes, SERVICE_NAME_KEY))
        .map(str::to_string)
}

pub fn extract_operation_name(span: &Span) -> Option<String> {
    first_str(&span.attributes, OPERATION_KEYS)
}

pub fn extract_model(span: &Span) -> Option<String> {
    first_str(&span.attributes, MODEL_KEYS)
}

pub fn extract_input_tokens(span: &Span) -> Option<i64> {
    first_i64(&span.attributes, INPUT_TOKEN_KEYS)
}

pub fn extract_output_tokens(span: &Span) -> Option<i64> {
    first_i64(&span.attributes, OUTPUT_TOKEN_KEYS)
}

/// Materialize an ingested span into its stored row, deriving the index
/// fields from the attribute maps.
///
/// Total tokens is input + output when either side is present; a span that
/// reports neither stays NULL so it is skipped by token aggregation.
pub fn to_span_row(span: Span) -> SpanRow {
    let service_name = extract_service_name(&span);
    let operation_name = extract_operation_name(&span);
    let model = extract_model(&span);
    let input_tokens = extract_input_tokens(&span);
    let output_tokens = extract_output_tokens(&span);
    let total_tokens = match (input_tokens, output_tokens) {
        (None, None) => None,
        (i, o) => Some(i.unwrap_or(0) + o.unwrap_or(0)),
    };
    let instrumentation_name = get_nested_str(&span.scope, "name").map(str::to_string);
    let instrumentation_version = get_nested_str(&span.scope, "version").map(str::to_string);

    SpanRow {
        conversation_id: span.conversation_id,
        trace_id: span.trace_id,
        span_id: span.span_id,
        parent_span_id: span.parent_span_id,
        name: span.name,
        kind: span.kind,
        start_time_unix_nano: span.start_time_unix_nano,
        end_time_unix_nano: span.end_time_unix_nano,
        status_code: span.status.code,
        service_name,
        operation_name,
        instrumentation_name,
        instrumentation_version,
        model,
        input_tokens,
        output_tokens,
        total_tokens,
        attributes: span.attributes,
        resource: span.resource,
        scope: span.scope,
        events: span.events,
        links: span.links,
    }
}
