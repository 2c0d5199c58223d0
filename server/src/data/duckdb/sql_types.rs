//! SQL type wrappers for DuckDB
//!
//! Shared type wrappers for converting Rust types to DuckDB-compatible SQL values.

use chrono::{DateTime, Utc};
use duckdb::ToSql;
use duckdb::types::{ToSqlOutput, Value};

use crate::utils::time::UnixNanos;

/// Wrapper for DateTime<Utc> to implement ToSql for DuckDB TIMESTAMP
pub struct SqlTimestamp(pub DateTime<Utc>);

impl ToSql for SqlTimestamp {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        let ts = self.0.format("%Y-%m-%d %H:%M:%S%.6f").to_string();
        Ok(ToSqlOutput::Owned(Value::Text(ts)))
    }
}

/// An owned parameter for dynamically built WHERE clauses.
///
/// Filter conditions are assembled at runtime, so their bind values have to
/// live in one homogeneous list that can still carry the full HUGEINT range
/// for nanosecond timestamps.
#[derive(Debug, Clone)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Nanos(UnixNanos),
    Float(f64),
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Text(s) => ToSqlOutput::Owned(Value::Text(s.clone())),
            SqlValue::Int(i) => ToSqlOutput::Owned(Value::BigInt(*i)),
            SqlValue::Nanos(n) => ToSqlOutput::Owned(Value::HugeInt(n.as_i128())),
            SqlValue::Float(f) => ToSqlOutput::Owned(Value::Double(*f)),
        })
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<UnixNanos> for SqlValue {
    fn from(n: UnixNanos) -> Self {
        SqlValue::Nanos(n)
    }
}

/// Convert an owned parameter list into the borrowed form `query_row` and
/// friends expect.
pub fn as_params(values: &[SqlValue]) -> Vec<&dyn ToSql> {
    values.iter().map(|v| v as &dyn ToSql).collect()
}
