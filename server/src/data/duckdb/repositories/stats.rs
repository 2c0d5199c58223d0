//! Trace statistics rollup

use std::collections::BTreeMap;

use duckdb::Connection;

use crate::data::duckdb::DuckdbError;
use crate::data::duckdb::sql_types::{SqlValue, as_params};
use crate::data::types::span::STATUS_ERROR;
use crate::data::types::trace::{StatisticsFilter, TraceStatistics};

fn build_conditions(filter: &StatisticsFilter, values: &mut Vec<SqlValue>) -> String {
    let mut conditions: Vec<&str> = Vec::new();
    if let Some(start) = filter.start_time {
        values.push(SqlValue::Nanos(start));
        conditions.push("start_time_ns >= ?");
    }
    if let Some(end) = filter.end_time {
        values.push(SqlValue::Nanos(end));
        conditions.push("start_time_ns <= ?");
    }
    if let Some(ref service) = filter.service_name {
        values.push(SqlValue::Text(service.clone()));
        conditions.push("service_name = ?");
    }
    if let Some(ref operation) = filter.operation_name {
        values.push(SqlValue::Text(operation.clone()));
        conditions.push("operation_name = ?");
    }
    if conditions.is_empty() {
        "1=1".to_string()
    } else {
        conditions.join(" AND ")
    }
}

/// Compute store-wide statistics over the spans matching `filter`.
///
/// A trace's duration is its wall-clock extent (max end - min start over
/// matched spans); a trace counts as errored when any matched span carries
/// the error status.
pub fn get_statistics(
    conn: &Connection,
    filter: &StatisticsFilter,
) -> Result<TraceStatistics, DuckdbError> {
    let mut values: Vec<SqlValue> = Vec::new();
    let conds = build_conditions(filter, &mut values);

    let sql = format!(
        "WITH matched AS (\
             SELECT trace_id, start_time_ns, end_time_ns, status_code, total_tokens \
             FROM agent_spans WHERE {conds}), \
         per_trace AS (\
             SELECT trace_id, \
                    MIN(start_time_ns) AS min_ns, \
                    MAX(end_time_ns) AS max_ns, \
                    MAX(CASE WHEN status_code = {err} THEN 1 ELSE 0 END) AS has_error \
             FROM matched GROUP BY trace_id) \
         SELECT (SELECT COUNT(*) FROM per_trace), \
                (SELECT COUNT(*) FROM matched), \
                (SELECT COUNT(*) FROM per_trace WHERE has_error = 1), \
                (SELECT COALESCE(AVG((max_ns - min_ns) / 1e9), 0) FROM per_trace), \
                (SELECT COALESCE(SUM(total_tokens), 0) FROM matched)",
        err = STATUS_ERROR,
    );

    let (total_traces, total_spans, error_traces, avg_duration, total_tokens) = conn.query_row(
        &sql,
        as_params(&values).as_slice(),
        |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, i128>(4)?,
            ))
        },
    )?;

    let histogram_sql = format!(
        "WITH matched AS (\
             SELECT trace_id, status_code FROM agent_spans WHERE {conds}) \
         SELECT status_code, COUNT(DISTINCT trace_id) \
         FROM matched GROUP BY status_code ORDER BY status_code",
    );
    let mut stmt = conn.prepare(&histogram_sql)?;
    let rows = stmt.query_map(as_params(&values).as_slice(), |row| {
        Ok((row.get::<_, i32>(0)?, row.get::<_, i64>(1)? as u64))
    })?;
    let traces_by_status: BTreeMap<i32, u64> = rows.collect::<Result<_, _>>()?;

    Ok(TraceStatistics {
        total_traces: total_traces as u64,
        total_spans: total_spans as u64,
        error_traces: error_traces as u64,
        avg_duration,
        total_tokens: total_tokens as i64,
        traces_by_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::AppStorage;
    use crate::data::duckdb::repositories::span as span_repository;
    use crate::data::duckdb::DuckdbService;
    use crate::data::types::span::{STATUS_OK, SpanRow};
    use crate::utils::time::UnixNanos;
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

    fn span(trace_id: &str, span_id: &str, start: i128, end: i128, status: i32) -> SpanRow {
        SpanRow {
            trace_id: trace_id.to_string(),
            span_id: span_id.to_string(),
            name: "op".to_string(),
            start_time_unix_nano: UnixNanos(start),
            end_time_unix_nano: UnixNanos(end),
            status_code: status,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_statistics_empty_store() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        let stats = get_statistics(&conn, &StatisticsFilter::default()).unwrap();
        assert_eq!(stats.total_traces, 0);
        assert_eq!(stats.total_spans, 0);
        assert_eq!(stats.error_traces, 0);
        assert_eq!(stats.avg_duration, 0.0);
        assert_eq!(stats.total_tokens, 0);
        assert!(stats.traces_by_status.is_empty());
    }

    #[tokio::test]
    async fn test_statistics_counts_and_avg() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        // t1 spans 1s wall clock, t2 spans 3s; one t2 span errored
        let mut s3 = span("t2", "b", 0, 2_000_000_000, STATUS_ERROR);
        s3.total_tokens = Some(10);
        span_repository::insert_batch(
            &conn,
            &[
                span("t1", "a", 0, 1_000_000_000, STATUS_OK),
                span("t2", "a", 1_000_000_000, 3_000_000_000, STATUS_OK),
                s3,
            ],
        )
        .unwrap();

        let stats = get_statistics(&conn, &StatisticsFilter::default()).unwrap();
        assert_eq!(stats.total_traces, 2);
        assert_eq!(stats.total_spans, 3);
        assert_eq!(stats.error_traces, 1);
        assert!((stats.avg_duration - 2.0).abs() < 1e-9);
        assert_eq!(stats.total_tokens, 10);
        assert_eq!(stats.traces_by_status.get(&STATUS_OK), Some(&2));
        assert_eq!(stats.traces_by_status.get(&STATUS_ERROR), Some(&1));
    }

    #[tokio::test]
    async fn test_statistics_time_filter() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        span_repository::insert_batch(
            &conn,
            &[
                span("t1", "a", 100, 200, STATUS_OK),
                span("t2", "a", 900, 950, STATUS_OK),
            ],
        )
        .unwrap();

        let filter = StatisticsFilter {
            start_time: Some(UnixNanos(500)),
            ..Default::default()
        };
        let stats = get_statistics(&conn, &filter).unwrap();
        assert_eq!(stats.total_traces, 1);
        assert_eq!(stats.total_spans, 1);
    }

    #[tokio::test]
    async fn test_statistics_service_filter() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        let mut a = span("t1", "a", 100, 200, STATUS_OK);
        a.service_name = Some("svc-a".to_string());
        let mut b = span("t2", "b", 100, 200, STATUS_OK);
        b.service_name = Some("svc-b".to_string());
        span_repository::insert_batch(&conn, &[a, b]).unwrap();

        let filter = StatisticsFilter {
            service_name: Some("svc-a".to_string()),
            ..Default::default()
        };
        let stats = get_statistics(&conn, &filter).unwrap();
        assert_eq!(stats.total_traces, 1);
    }
}
