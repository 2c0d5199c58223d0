//! Span repository: batch ingestion and per-trace reads
//!
//! Writes go through the Appender API for throughput; reads map the typed
//! columns back into [`SpanRow`] and re-parse the JSON payload columns.

use chrono::Utc;
use duckdb::{Connection, Row, params};

use crate::data::duckdb::sql_types::{SqlTimestamp, SqlValue, as_params};
use crate::data::duckdb::{DuckdbError, in_transaction};
use crate::data::types::span::SpanRow;
use crate::utils::json::{json_to_opt_string, parse_json_column};
use crate::utils::time::UnixNanos;

/// Columns selected for reads, in `map_row` order.
pub(crate) const SELECT_COLUMNS: &str = "conversation_id, trace_id, span_id, parent_span_id, \
     name, kind, status_code, start_time_ns, end_time_ns, \
     service_name, operation_name, instrumentation_name, instrumentation_version, \
     model, input_tokens, output_tokens, total_tokens, \
     attributes::VARCHAR, resource::VARCHAR, scope::VARCHAR, events::VARCHAR, links::VARCHAR";

/// Insert a batch of spans in one transaction.
pub fn insert_batch(conn: &Connection, spans: &[SpanRow]) -> Result<(), DuckdbError> {
    if spans.is_empty() {
        return Ok(());
    }

    in_transaction(conn, |conn| {
        let mut appender = conn.appender("agent_spans")?;

        for span in spans {
            // Column order must match schema.rs CREATE TABLE definition
            appender.append_row(params![
                // IDENTITY
                span.conversation_id.as_deref(),
                span.trace_id.as_str(),
                span.span_id.as_str(),
                span.parent_span_id.as_deref(),
                // SPAN METADATA
                span.name.as_str(),
                span.kind,
                span.status_code,
                // TIMING
                SqlValue::Nanos(span.start_time_unix_nano),
                SqlValue::Nanos(span.end_time_unix_nano),
                SqlTimestamp(Utc::now()),
                // DERIVED
                span.service_name.as_deref(),
                span.operation_name.as_deref(),
                span.instrumentation_name.as_deref(),
                span.instrumentation_version.as_deref(),
                span.model.as_deref(),
                span.input_tokens,
                span.output_tokens,
                span.total_tokens,
                // RAW PAYLOAD
                json_to_opt_string(&span.attributes).as_deref(),
                json_to_opt_string(&span.resource).as_deref(),
                json_to_opt_string(&span.scope).as_deref(),
                json_to_opt_string(&span.events).as_deref().unwrap_or("[]"),
                json_to_opt_string(&span.links).as_deref().unwrap_or("[]"),
            ])?;
        }

        appender.flush()?;
        Ok(())
    })
}

/// Delete all spans belonging to the given conversations, returning the
/// number of rows removed. An empty id list is a no-op.
pub fn delete_by_conversations(
    conn: &Connection,
    conversation_ids: &[String],
) -> Result<usize, DuckdbError> {
    if conversation_ids.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["?"; conversation_ids.len()].join(", ");
    let sql = format!(
        "DELETE FROM agent_spans WHERE conversation_id IN ({})",
        placeholders
    );
    let values: Vec<SqlValue> = conversation_ids
        .iter()
        .map(|id| SqlValue::Text(id.clone()))
        .collect();

    let deleted = conn.execute(&sql, as_params(&values).as_slice())?;
    Ok(deleted)
}

/// Fetch all spans of a trace in (start time, span id) order.
pub fn get_spans_for_trace(conn: &Connection, trace_id: &str) -> Result<Vec<SpanRow>, DuckdbError> {
    let sql = format!(
        "SELECT {} FROM agent_spans WHERE trace_id = ? ORDER BY start_time_ns ASC, span_id ASC",
        SELECT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![trace_id], map_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Map one result row in `SELECT_COLUMNS` order.
pub(crate) fn map_row(row: &Row<'_>) -> duckdb::Result<SpanRow> {
    let attributes: Option<String> = row.get(17)?;
    let resource: Option<String> = row.get(18)?;
    let scope: Option<String> = row.get(19)?;
    let events: Option<String> = row.get(20)?;
    let links: Option<String> = row.get(21)?;

    Ok(SpanRow {
        conversation_id: row.get(0)?,
        trace_id: row.get(1)?,
        span_id: row.get(2)?,
        parent_span_id: row.get(3)?,
        name: row.get(4)?,
        kind: row.get(5)?,
        status_code: row.get(6)?,
        start_time_unix_nano: UnixNanos(row.get::<_, i128>(7)?),
        end_time_unix_nano: UnixNanos(row.get::<_, i128>(8)?),
        service_name: row.get(9)?,
        operation_name: row.get(10)?,
        instrumentation_name: row.get(11)?,
        instrumentation_version: row.get(12)?,
        model: row.get(13)?,
        input_tokens: row.get(14)?,
        output_tokens: row.get(15)?,
        total_tokens: row.get(16)?,
        attributes: parse_json_column(&attributes),
        resource: parse_json_column(&resource),
        scope: parse_json_column(&scope),
        events: parse_json_column(&events),
        links: parse_json_column(&links),
    })
}
