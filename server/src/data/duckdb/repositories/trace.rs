//! Trace repository: listing, detail, and aggregation
//!
//! A trace is represented in the listing by its root span. When a trace has
//! no root (its top spans point at parents that were never stored), each
//! span whose parent is missing stands in as an orphan representative, so
//! partially ingested traces stay visible.

use duckdb::Connection;

use crate::data::duckdb::DuckdbError;
use crate::data::duckdb::filters::{build_trace_conditions, trace_sort_column, where_clause};
use crate::data::duckdb::repositories::span as span_repository;
use crate::data::duckdb::sql_types::{SqlValue, as_params};
use crate::data::types::span::{STATUS_ERROR, STATUS_OK};
use crate::data::types::table::{TableData, TableRequestParams};
use crate::data::types::trace::{TraceDetail, TraceSummary};
use crate::utils::time::UnixNanos;

/// Representative span rows: true roots, plus orphan stand-ins for traces
/// that have no root at all.
const REPS_SQL: &str = "\
    SELECT s.trace_id, s.span_id, s.name, s.start_time_ns, s.end_time_ns, \
           s.status_code, s.total_tokens, FALSE AS is_orphan \
    FROM agent_spans s \
    WHERE s.parent_span_id IS NULL OR s.parent_span_id = '' \
    UNION ALL \
    SELECT s.trace_id, s.span_id, s.name, s.start_time_ns, s.end_time_ns, \
           s.status_code, s.total_tokens, TRUE AS is_orphan \
    FROM agent_spans s \
    WHERE s.parent_span_id IS NOT NULL AND s.parent_span_id != '' \
      AND NOT EXISTS (\
          SELECT 1 FROM agent_spans p \
          WHERE p.trace_id = s.trace_id AND p.span_id = s.parent_span_id) \
      AND NOT EXISTS (\
          SELECT 1 FROM agent_spans r \
          WHERE r.trace_id = s.trace_id \
            AND (r.parent_span_id IS NULL OR r.parent_span_id = ''))";

/// Paginated, filtered, sorted trace listing.
///
/// Aggregates (span count, token sum) cover the representative's whole
/// descendant closure and are computed only for the filtered rows, via a
/// recursive CTE.
pub fn list_traces(
    conn: &Connection,
    request: &TableRequestParams,
) -> Result<TableData<TraceSummary>, DuckdbError> {
    let pagination = request.pagination.normalize();

    let mut values: Vec<SqlValue> = Vec::new();
    let conditions = build_trace_conditions(request.filters.as_ref(), &mut values);
    let where_body = where_clause(&conditions);

    let count_sql = format!(
        "WITH reps AS ({REPS_SQL}) SELECT COUNT(*) FROM reps r WHERE {where_body}"
    );
    let total: i64 = conn.query_row(&count_sql, as_params(&values).as_slice(), |row| row.get(0))?;

    let sort_col = trace_sort_column(request.sort.as_ref());
    let sort_dir = request
        .sort
        .as_ref()
        .map(|s| s.order)
        .unwrap_or_default()
        .as_sql();

    let data_sql = format!(
        "WITH RECURSIVE reps AS ({REPS_SQL}), \
         filtered AS (\
             SELECT r.trace_id, r.span_id, r.name, r.start_time_ns, r.end_time_ns, \
                    r.status_code, r.total_tokens, r.is_orphan, \
                    r.end_time_ns - r.start_time_ns AS duration_ns \
             FROM reps r WHERE {where_body}), \
         closure AS (\
             SELECT f.span_id AS rep_span_id, f.trace_id, f.span_id, f.total_tokens \
             FROM filtered f \
             UNION ALL \
             SELECT c.rep_span_id, s.trace_id, s.span_id, s.total_tokens \
             FROM closure c \
             JOIN agent_spans s \
               ON s.trace_id = c.trace_id AND s.parent_span_id = c.span_id), \
         rollup AS (\
             SELECT rep_span_id, COUNT(*) AS span_count, \
                    SUM(total_tokens) AS total_tokens_sum \
             FROM closure GROUP BY rep_span_id) \
         SELECT f.trace_id, f.span_id, f.name, f.start_time_ns, f.end_time_ns, \
                f.duration_ns / 1e9 AS duration_s, f.status_code, \
                ru.span_count, ru.total_tokens_sum, f.is_orphan \
         FROM filtered f \
         JOIN rollup ru ON ru.rep_span_id = f.span_id \
         ORDER BY {sort_col} {sort_dir}, f.start_time_ns DESC, f.span_id ASC \
         LIMIT {limit} OFFSET {offset}",
        limit = pagination.page_size,
        offset = pagination.offset(),
    );

    let mut stmt = conn.prepare(&data_sql)?;
    let rows = stmt.query_map(as_params(&values).as_slice(), |row| {
        Ok(TraceSummary {
            trace_id: row.get(0)?,
            span_id: row.get(1)?,
            name: row.get(2)?,
            start_time: UnixNanos(row.get::<_, i128>(3)?),
            end_time: UnixNanos(row.get::<_, i128>(4)?),
            duration: row.get(5)?,
            status: row.get(6)?,
            span_count: row.get::<_, i64>(7)? as u64,
            total_tokens: row.get::<_, Option<i128>>(8)?.map(|t| t as i64),
            is_orphan: row.get(9)?,
        })
    })?;
    let list = rows.collect::<Result<Vec<_>, _>>()?;

    Ok(TableData {
        list,
        total: total as u64,
        page: pagination.page,
        page_size: pagination.page_size,
    })
}

/// Load one trace in full. Returns `Ok(None)` when no spans exist for the
/// trace id.
pub fn get_trace(conn: &Connection, trace_id: &str) -> Result<Option<TraceDetail>, DuckdbError> {
    let spans = span_repository::get_spans_for_trace(conn, trace_id)?;
    if spans.is_empty() {
        return Ok(None);
    }

    let start_time = spans
        .iter()
        .map(|s| s.start_time_unix_nano)
        .min()
        .unwrap_or_default();
    let end_time = spans
        .iter()
        .map(|s| s.end_time_unix_nano)
        .max()
        .unwrap_or_default();
    let status = if spans.iter().any(|s| s.status_code == STATUS_ERROR) {
        STATUS_ERROR
    } else {
        STATUS_OK
    };
    let total_tokens = spans
        .iter()
        .filter_map(|s| s.total_tokens)
        .fold(None, |acc: Option<i64>, t| Some(acc.unwrap_or(0) + t));

    Ok(Some(TraceDetail {
        trace_id: trace_id.to_string(),
        duration: end_time.secs_since(start_time),
        start_time,
        end_time,
        status,
        total_tokens,
        spans,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::AppStorage;
    use crate::data::duckdb::DuckdbService;
    use crate::data::types::span::SpanRow;
    use crate::data::types::table::{Pagination, SortOrder, SortSpec};
    use serde_json::json;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    async fn create_test_service() -> (TempDir, DuckdbService) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        tokio::fs::create_dir_all(temp_dir.path().join("duckdb"))
            .await
            .expect("Failed to create duckdb dir");
        let storage = AppStorage::init_for_test(temp_dir.path().to_path_buf());
        let service = DuckdbService::init(&storage)
            .await
            .expect("Failed to init service");
        (temp_dir, service)
    }

    fn span(
        trace_id: &str,
        span_id: &str,
        parent: Option<&str>,
        start_ns: i128,
        tokens: Option<i64>,
    ) -> SpanRow {
        SpanRow {
            trace_id: trace_id.to_string(),
            span_id: span_id.to_string(),
            parent_span_id: parent.map(str::to_string),
            name: format!("op-{}", span_id),
            start_time_unix_nano: UnixNanos(start_ns),
            end_time_unix_nano: UnixNanos(start_ns + 2_000_000_000),
            total_tokens: tokens,
            ..Default::default()
        }
    }

    fn request() -> TableRequestParams {
        TableRequestParams::default()
    }

    #[tokio::test]
    async fn test_list_aggregates_descendant_closure() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();

        // Depth-4 chain plus a sibling; tokens on some spans only
        span_repository::insert_batch(
            &conn,
            &[
                span("t1", "root", None, 100, Some(10)),
                span("t1", "a", Some("root"), 200, Some(5)),
                span("t1", "b", Some("a"), 300, None),
                span("t1", "c", Some("b"), 400, Some(1)),
                span("t1", "sib", Some("root"), 250, None),
            ],
        )
        .unwrap();

        let page = list_traces(&conn, &request()).unwrap();
        assert_eq!(page.total, 1);
        let row = &page.list[0];
        assert_eq!(row.trace_id, "t1");
        assert_eq!(row.span_id, "root");
        assert_eq!(row.span_count, 5);
        assert_eq!(row.total_tokens, Some(16));
        assert!(!row.is_orphan);
        assert!((row.duration - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_list_tokens_none_when_no_span_reports() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        span_repository::insert_batch(
            &conn,
            &[
                span("t1", "root", None, 100, None),
                span("t1", "a", Some("root"), 200, None),
            ],
        )
        .unwrap();

        let page = list_traces(&conn, &request()).unwrap();
        assert_eq!(page.list[0].total_tokens, None);
    }

    #[tokio::test]
    async fn test_orphans_represent_rootless_trace() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        // No root in t1: two spans whose parents were never stored
        span_repository::insert_batch(
            &conn,
            &[
                span("t1", "x", Some("missing-1"), 100, Some(3)),
                span("t1", "y", Some("x"), 200, Some(4)),
                span("t1", "z", Some("missing-2"), 300, None),
            ],
        )
        .unwrap();

        let page = list_traces(&conn, &request()).unwrap();
        assert_eq!(page.total, 2);
        assert!(page.list.iter().all(|r| r.is_orphan));

        let x = page.list.iter().find(|r| r.span_id == "x").unwrap();
        assert_eq!(x.span_count, 2);
        assert_eq!(x.total_tokens, Some(7));
        let z = page.list.iter().find(|r| r.span_id == "z").unwrap();
        assert_eq!(z.span_count, 1);
        assert_eq!(z.total_tokens, None);
    }

    #[tokio::test]
    async fn test_orphans_suppressed_when_root_exists() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        span_repository::insert_batch(
            &conn,
            &[
                span("t1", "root", None, 100, None),
                span("t1", "stray", Some("gone"), 200, None),
            ],
        )
        .unwrap();

        let page = list_traces(&conn, &request()).unwrap();
        // The true root represents the trace; the stray span is not listed
        assert_eq!(page.total, 1);
        assert_eq!(page.list[0].span_id, "root");
    }

    #[tokio::test]
    async fn test_pagination_reconstructs_full_set() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        let spans: Vec<SpanRow> = (0..25)
            .map(|i| span(&format!("t{:02}", i), &format!("s{:02}", i), None, 1000 + i as i128, None))
            .collect();
        span_repository::insert_batch(&conn, &spans).unwrap();

        let mut seen = Vec::new();
        for page_no in 1..=3 {
            let mut req = request();
            req.pagination = Pagination {
                page: page_no,
                page_size: 10,
            };
            let page = list_traces(&conn, &req).unwrap();
            assert_eq!(page.total, 25);
            assert_eq!(page.page, page_no);
            seen.extend(page.list.into_iter().map(|r| r.trace_id));
        }
        assert_eq!(seen.len(), 25);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 25, "pages must not overlap");
    }

    #[tokio::test]
    async fn test_time_range_filter_bounds_inclusive() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        span_repository::insert_batch(
            &conn,
            &[
                span("before", "s1", None, 99, None),
                span("lo", "s2", None, 100, None),
                span("hi", "s3", None, 200, None),
                span("after", "s4", None, 201, None),
            ],
        )
        .unwrap();

        let mut req = request();
        req.filters = Some(BTreeMap::from([(
            "timeRange".to_string(),
            json!({"operator": "between", "value": ["100", "200"]}),
        )]));
        let page = list_traces(&conn, &req).unwrap();
        let mut ids: Vec<String> = page.list.into_iter().map(|r| r.trace_id).collect();
        ids.sort();
        assert_eq!(ids, vec!["hi", "lo"]);
    }

    #[tokio::test]
    async fn test_name_contains_filter() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        span_repository::insert_batch(
            &conn,
            &[
                span("t1", "alpha", None, 100, None),
                span("t2", "beta", None, 200, None),
            ],
        )
        .unwrap();

        let mut req = request();
        req.filters = Some(BTreeMap::from([(
            "name".to_string(),
            json!({"operator": "contains", "value": "alph"}),
        )]));
        let page = list_traces(&conn, &req).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.list[0].trace_id, "t1");
    }

    #[tokio::test]
    async fn test_unknown_filter_is_noop() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        span_repository::insert_batch(&conn, &[span("t1", "s1", None, 100, None)]).unwrap();

        let mut req = request();
        req.filters = Some(BTreeMap::from([(
            "name".to_string(),
            json!({"operator": "regex", "value": ".*"}),
        )]));
        let page = list_traces(&conn, &req).unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_sort_by_total_tokens_with_tie_break() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        // t1 and t2 tie on tokens; later start time wins the tie
        span_repository::insert_batch(
            &conn,
            &[
                span("t1", "s1", None, 100, Some(5)),
                span("t2", "s2", None, 200, Some(5)),
                span("t3", "s3", None, 300, Some(9)),
            ],
        )
        .unwrap();

        let mut req = request();
        req.sort = Some(SortSpec {
            field: "totalTokens".to_string(),
            order: SortOrder::Desc,
        });
        let page = list_traces(&conn, &req).unwrap();
        let ids: Vec<String> = page.list.into_iter().map(|r| r.trace_id).collect();
        assert_eq!(ids, vec!["t3", "t2", "t1"]);
    }

    #[tokio::test]
    async fn test_get_trace_aggregates() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        let mut err_span = span("t1", "b", Some("a"), 200, Some(5));
        err_span.status_code = STATUS_ERROR;
        span_repository::insert_batch(
            &conn,
            &[
                span("t1", "a", None, 100, Some(10)),
                err_span,
                span("t1", "c", Some("b"), 300, Some(0)),
            ],
        )
        .unwrap();

        let detail = get_trace(&conn, "t1").unwrap().unwrap();
        assert_eq!(detail.spans.len(), 3);
        assert_eq!(detail.start_time.0, 100);
        assert_eq!(detail.end_time.0, 300 + 2_000_000_000);
        assert_eq!(detail.status, STATUS_ERROR);
        assert_eq!(detail.total_tokens, Some(15));
    }

    #[tokio::test]
    async fn test_get_trace_ok_status_when_no_errors() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        span_repository::insert_batch(&conn, &[span("t1", "a", None, 100, None)]).unwrap();

        let detail = get_trace(&conn, "t1").unwrap().unwrap();
        assert_eq!(detail.status, STATUS_OK);
        assert_eq!(detail.total_tokens, None);
    }

    #[tokio::test]
    async fn test_get_trace_missing_is_none() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        assert!(get_trace(&conn, "nope").unwrap().is_none());
    }
}
