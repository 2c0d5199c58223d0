//! DuckDB schema definitions
//!
//! One wide table holds every ingested span; the fields that queries
//! filter, sort, and aggregate on are extracted into typed columns at
//! ingestion time, the rest stays as JSON.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- Infrastructure: Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at BIGINT NOT NULL,
    description VARCHAR
);

-- ═══════════════════════════════════════════════════════════════════════════════
-- Agent spans table: every ingested span
-- Timestamps are nanoseconds since epoch; HUGEINT keeps full precision
-- ═══════════════════════════════════════════════════════════════════════════════
CREATE TABLE IF NOT EXISTS agent_spans (
    -- IDENTITY
    conversation_id     VARCHAR,            -- Run/session grouping
    trace_id            VARCHAR NOT NULL,
    span_id             VARCHAR NOT NULL,
    parent_span_id      VARCHAR,            -- NULL or '' = root

    -- SPAN METADATA
    name                VARCHAR NOT NULL,
    kind                INTEGER NOT NULL DEFAULT 0,
    status_code         INTEGER NOT NULL DEFAULT 0,  -- 0 unset, 1 ok, 2 error

    -- TIMING (nanoseconds since epoch)
    start_time_ns       HUGEINT NOT NULL,
    end_time_ns         HUGEINT NOT NULL,
    ingested_at         TIMESTAMP NOT NULL DEFAULT (now()),

    -- DERIVED (extracted from attributes at ingestion)
    service_name            VARCHAR,
    operation_name          VARCHAR,
    instrumentation_name    VARCHAR,
    instrumentation_version VARCHAR,
    model                   VARCHAR,
    input_tokens            BIGINT,         -- NULL = not reported
    output_tokens           BIGINT,
    total_tokens            BIGINT,

    -- RAW PAYLOAD
    attributes          JSON,
    resource            JSON,
    scope               JSON,
    events              JSON NOT NULL DEFAULT '[]',
    links               JSON NOT NULL DEFAULT '[]'
);

-- Indexes for trace queries
CREATE INDEX IF NOT EXISTS idx_spans_trace ON agent_spans(trace_id);
CREATE INDEX IF NOT EXISTS idx_spans_trace_parent ON agent_spans(trace_id, parent_span_id);
CREATE INDEX IF NOT EXISTS idx_spans_conversation ON agent_spans(conversation_id);
CREATE INDEX IF NOT EXISTS idx_spans_start_time ON agent_spans(start_time_ns DESC);
"#;
