//! SQL condition building for table queries
//!
//! Translates parsed filter specs into parameterized WHERE fragments.
//! Fields and operators outside the supported vocabulary are skipped with
//! a warning rather than failing the query.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;
use tracing::warn;

use super::sql_types::SqlValue;
use crate::data::types::table::{FilterSpec, RangeValue, SortSpec};
use crate::utils::sql::escape_like_pattern;

/// Fields of the trace listing that may be filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceField {
    Name,
    TimeRange,
}

impl TraceField {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "name" => Some(TraceField::Name),
            "timeRange" => Some(TraceField::TimeRange),
            _ => None,
        }
    }

    /// Column the field maps to, under the `r` alias of the representative
    /// span rows.
    pub fn column(&self) -> &'static str {
        match self {
            TraceField::Name => "r.name",
            TraceField::TimeRange => "r.start_time_ns",
        }
    }

    /// Whether an operator family makes sense for this field.
    fn accepts(&self, spec: &FilterSpec) -> bool {
        match self {
            TraceField::Name => matches!(
                spec,
                FilterSpec::Contains(_)
                    | FilterSpec::NotContains(_)
                    | FilterSpec::In(_)
                    | FilterSpec::NotIn(_)
            ),
            TraceField::TimeRange => matches!(
                spec,
                FilterSpec::Between(..)
                    | FilterSpec::NotBetween(..)
                    | FilterSpec::Eq(_)
                    | FilterSpec::Ne(_)
                    | FilterSpec::Gt(_)
                    | FilterSpec::Gte(_)
                    | FilterSpec::Lt(_)
                    | FilterSpec::Lte(_)
            ),
        }
    }
}

fn push_range(value: RangeValue, params: &mut Vec<SqlValue>) {
    match value {
        RangeValue::Number(n) => params.push(SqlValue::Float(n)),
        RangeValue::Nanos(n) => params.push(SqlValue::Nanos(n)),
    }
}

fn json_param(value: &JsonValue) -> SqlValue {
    match value {
        JsonValue::String(s) => SqlValue::Text(s.clone()),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Int(i),
            None => SqlValue::Float(n.as_f64().unwrap_or(0.0)),
        },
        JsonValue::Bool(b) => SqlValue::Int(*b as i64),
        other => SqlValue::Text(other.to_string()),
    }
}

impl FilterSpec {
    /// Render this filter as a parameterized SQL condition on `column`,
    /// appending bind values to `params`.
    pub fn to_sql(&self, column: &str, params: &mut Vec<SqlValue>) -> String {
        match self {
            FilterSpec::Eq(v) => {
                params.push(SqlValue::Float(*v));
                format!("{} = ?", column)
            }
            FilterSpec::Ne(v) => {
                params.push(SqlValue::Float(*v));
                format!("{} != ?", column)
            }
            FilterSpec::Gt(v) => {
                params.push(SqlValue::Float(*v));
                format!("{} > ?", column)
            }
            FilterSpec::Gte(v) => {
                params.push(SqlValue::Float(*v));
                format!("{} >= ?", column)
            }
            FilterSpec::Lt(v) => {
                params.push(SqlValue::Float(*v));
                format!("{} < ?", column)
            }
            FilterSpec::Lte(v) => {
                params.push(SqlValue::Float(*v));
                format!("{} <= ?", column)
            }
            FilterSpec::Between(lo, hi) => {
                push_range(*lo, params);
                push_range(*hi, params);
                format!("{col} >= ? AND {col} <= ?", col = column)
            }
            FilterSpec::NotBetween(lo, hi) => {
                push_range(*lo, params);
                push_range(*hi, params);
                format!("NOT ({col} >= ? AND {col} <= ?)", col = column)
            }
            FilterSpec::Contains(s) => {
                params.push(SqlValue::Text(format!("%{}%", escape_like_pattern(s))));
                format!("{} LIKE ? ESCAPE '\\'", column)
            }
            FilterSpec::NotContains(s) => {
                params.push(SqlValue::Text(format!("%{}%", escape_like_pattern(s))));
                format!("{} NOT LIKE ? ESCAPE '\\'", column)
            }
            FilterSpec::In(values) => {
                if values.is_empty() {
                    return "1 = 0".to_string();
                }
                for v in values {
                    params.push(json_param(v));
                }
                let placeholders = vec!["?"; values.len()].join(", ");
                format!("{} IN ({})", column, placeholders)
            }
            FilterSpec::NotIn(values) => {
                if values.is_empty() {
                    return "1 = 1".to_string();
                }
                for v in values {
                    params.push(json_param(v));
                }
                let placeholders = vec!["?"; values.len()].join(", ");
                format!("{} NOT IN ({})", column, placeholders)
            }
            FilterSpec::ArrayElementContains(s) => {
                params.push(SqlValue::Text(format!("%{}%", escape_like_pattern(s))));
                format!(
                    "EXISTS (SELECT 1 FROM UNNEST(CAST({} AS VARCHAR[])) AS u(el) \
                     WHERE u.el LIKE ? ESCAPE '\\')",
                    column
                )
            }
            FilterSpec::ArrayElementNotContains(s) => {
                params.push(SqlValue::Text(format!("%{}%", escape_like_pattern(s))));
                format!(
                    "NOT EXISTS (SELECT 1 FROM UNNEST(CAST({} AS VARCHAR[])) AS u(el) \
                     WHERE u.el LIKE ? ESCAPE '\\')",
                    column
                )
            }
        }
    }
}

/// Build the WHERE conditions for a trace listing request.
///
/// Unknown fields and operator/field mismatches contribute no condition.
pub fn build_trace_conditions(
    filters: Option<&BTreeMap<String, JsonValue>>,
    params: &mut Vec<SqlValue>,
) -> Vec<String> {
    let mut conditions = Vec::new();
    let Some(filters) = filters else {
        return conditions;
    };

    for (key, raw) in filters {
        let Some(field) = TraceField::from_key(key) else {
            warn!("ignoring filter on unknown field '{}'", key);
            continue;
        };
        let Some(spec) = FilterSpec::parse(key, raw) else {
            continue;
        };
        if !field.accepts(&spec) {
            warn!("ignoring filter on '{}': operator not applicable", key);
            continue;
        }
        conditions.push(spec.to_sql(field.column(), params));
    }

    conditions
}

/// Join conditions into a WHERE body, `1=1` when unconstrained.
pub fn where_clause(conditions: &[String]) -> String {
    if conditions.is_empty() {
        "1=1".to_string()
    } else {
        conditions.join(" AND ")
    }
}

/// Sortable columns of the trace listing. Unknown fields fall back to the
/// start time.
pub fn trace_sort_column(sort: Option<&SortSpec>) -> &'static str {
    match sort.map(|s| s.field.as_str()) {
        Some("duration") => "f.duration_ns",
        Some("status") => "f.status_code",
        Some("totalTokens") => "ru.total_tokens_sum",
        Some("startTime") | None => "f.start_time_ns",
        Some(other) => {
            warn!("ignoring sort on unknown field '{}'", other);
            "f.start_time_ns"
        }
    }
}
