//! Model-invocation rollup per conversation

use duckdb::{Connection, params};

use crate::core::constants::CHAT_OPERATIONS;
use crate::data::duckdb::DuckdbError;
use crate::data::types::trace::{
    ModelInvocationData, ModelInvocationGroup, TokenAverages, TokenTotals,
};

fn averages(tokens: &TokenTotals, invocations: u64) -> TokenAverages {
    if invocations == 0 {
        return TokenAverages::default();
    }
    let n = invocations as f64;
    TokenAverages {
        input: tokens.input as f64 / n,
        output: tokens.output as f64 / n,
        total: tokens.total as f64 / n,
    }
}

/// Roll up model invocations (chat-family operations) for one conversation,
/// grouped per model with an overall summary.
///
/// Spans without a model attribute are grouped under `unknown`; an
/// invocation counts as a chat invocation when it reported token usage.
pub fn get_model_invocations(
    conn: &Connection,
    conversation_id: &str,
) -> Result<ModelInvocationData, DuckdbError> {
    let operations = CHAT_OPERATIONS
        .iter()
        .map(|op| format!("'{}'", op))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "SELECT COALESCE(model, 'unknown') AS model, \
                COUNT(*) AS invocations, \
                COUNT(*) FILTER (WHERE total_tokens IS NOT NULL) AS chat_invocations, \
                COALESCE(SUM(input_tokens), 0), \
                COALESCE(SUM(output_tokens), 0), \
                COALESCE(SUM(total_tokens), 0) \
         FROM agent_spans \
         WHERE conversation_id = ? AND operation_name IN ({operations}) \
         GROUP BY 1 \
         ORDER BY invocations DESC, model ASC",
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![conversation_id], |row| {
        let invocations = row.get::<_, i64>(1)? as u64;
        let tokens = TokenTotals {
            input: row.get::<_, i128>(3)? as i64,
            output: row.get::<_, i128>(4)? as i64,
            total: row.get::<_, i128>(5)? as i64,
        };
        Ok(ModelInvocationGroup {
            model: row.get(0)?,
            invocations,
            chat_invocations: row.get::<_, i64>(2)? as u64,
            average_tokens: averages(&tokens, invocations),
            tokens,
        })
    })?;
    let by_model = rows.collect::<Result<Vec<_>, _>>()?;

    let mut data = ModelInvocationData::default();
    for group in &by_model {
        data.total_invocations += group.invocations;
        data.chat_invocations += group.chat_invocations;
        data.tokens.input += group.tokens.input;
        data.tokens.output += group.tokens.output;
        data.tokens.total += group.tokens.total;
    }
    data.average_tokens = averages(&data.tokens, data.total_invocations);
    data.by_model = by_model;

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::AppStorage;
    use crate::data::duckdb::repositories::span as span_repository;
    use crate::data::duckdb::DuckdbService;
    use crate::data::types::span::SpanRow;
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

    fn invocation(
        span_id: &str,
        operation: &str,
        model: Option<&str>,
        tokens: Option<(i64, i64)>,
    ) -> SpanRow {
        SpanRow {
            conversation_id: Some("conv-1".to_string()),
            trace_id: "t1".to_string(),
            span_id: span_id.to_string(),
            name: operation.to_string(),
            operation_name: Some(operation.to_string()),
            model: model.map(str::to_string),
            input_tokens: tokens.map(|(i, _)| i),
            output_tokens: tokens.map(|(_, o)| o),
            total_tokens: tokens.map(|(i, o)| i + o),
            start_time_unix_nano: UnixNanos(100),
            end_time_unix_nano: UnixNanos(200),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_rollup_groups_by_model() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        span_repository::insert_batch(
            &conn,
            &[
                invocation("s1", "chat", Some("m-large"), Some((100, 20))),
                invocation("s2", "chat", Some("m-large"), Some((50, 10))),
                invocation("s3", "chat_model", Some("m-small"), Some((10, 5))),
                // Not a chat operation: excluded
                invocation("s4", "tool_call", Some("m-large"), None),
            ],
        )
        .unwrap();

        let data = get_model_invocations(&conn, "conv-1").unwrap();
        assert_eq!(data.total_invocations, 3);
        assert_eq!(data.chat_invocations, 3);
        assert_eq!(data.tokens.input, 160);
        assert_eq!(data.tokens.output, 35);
        assert_eq!(data.tokens.total, 195);
        assert!((data.average_tokens.total - 65.0).abs() < 1e-9);

        assert_eq!(data.by_model.len(), 2);
        // Sorted by invocation count
        assert_eq!(data.by_model[0].model, "m-large");
        assert_eq!(data.by_model[0].invocations, 2);
        assert_eq!(data.by_model[0].tokens.total, 180);
        assert!((data.by_model[0].average_tokens.total - 90.0).abs() < 1e-9);
        assert_eq!(data.by_model[1].model, "m-small");
    }

    #[tokio::test]
    async fn test_rollup_missing_model_is_unknown() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        span_repository::insert_batch(
            &conn,
            &[invocation("s1", "chat", None, Some((5, 5)))],
        )
        .unwrap();

        let data = get_model_invocations(&conn, "conv-1").unwrap();
        assert_eq!(data.by_model[0].model, "unknown");
    }

    #[tokio::test]
    async fn test_rollup_invocation_without_tokens() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        span_repository::insert_batch(
            &conn,
            &[invocation("s1", "chat", Some("m"), None)],
        )
        .unwrap();

        let data = get_model_invocations(&conn, "conv-1").unwrap();
        assert_eq!(data.total_invocations, 1);
        assert_eq!(data.chat_invocations, 0);
        assert_eq!(data.tokens.total, 0);
        assert_eq!(data.average_tokens.total, 0.0);
    }

    #[tokio::test]
    async fn test_rollup_empty_conversation() {
        let (_tmp, service) = create_test_service().await;
        let conn = service.conn();
        let data = get_model_invocations(&conn, "nope").unwrap();
        assert_eq!(data.total_invocations, 0);
        assert!(data.by_model.is_empty());
        assert_eq!(data.average_tokens.total, 0.0);
    }
}
