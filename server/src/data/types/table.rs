//! Table query protocol
//!
//! Shared request/response shapes for paginated table endpoints. Filters
//! arrive as a map of `field -> { operator, value }`; unknown operators are
//! tolerated and simply do not constrain the query.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::core::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MIN_PAGE_SIZE};
use crate::utils::time::UnixNanos;

/// 1-based pagination window.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Clamp to valid bounds: page >= 1, page size within the configured range.
    pub fn normalize(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

// Lenient by hand: an unrecognized order means descending, it must not
// fail the whole request.
impl<'de> Deserialize<'de> for SortOrder {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            other => {
                warn!("unknown sort order '{}', defaulting to desc", other);
                SortOrder::Desc
            }
        })
    }
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

/// Full request body for a table query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableRequestParams {
    pub pagination: Pagination,
    pub sort: Option<SortSpec>,
    pub filters: Option<BTreeMap<String, JsonValue>>,
}

/// Endpoint of a range filter: either a plain number or a nanosecond
/// timestamp string.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RangeValue {
    Number(f64),
    Nanos(UnixNanos),
}

/// A single parsed filter condition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "operator", content = "value", rename_all = "camelCase")]
pub enum FilterSpec {
    Eq(f64),
    Ne(f64),
    Gt(f64),
    Gte(f64),
    Lt(f64),
    Lte(f64),
    Between(RangeValue, RangeValue),
    NotBetween(RangeValue, RangeValue),
    Contains(String),
    NotContains(String),
    #[serde(rename = "in")]
    In(Vec<JsonValue>),
    NotIn(Vec<JsonValue>),
    ArrayElementContains(String),
    ArrayElementNotContains(String),
}

impl FilterSpec {
    /// Parse one `{ operator, value }` filter object.
    ///
    /// Unknown or malformed filters return `None` with a warning: callers
    /// built against older or newer filter vocabularies must not break the
    /// whole query.
    pub fn parse(field: &str, raw: &JsonValue) -> Option<FilterSpec> {
        match serde_json::from_value(raw.clone()) {
            Ok(spec) => Some(spec),
            Err(err) => {
                warn!("ignoring unsupported filter on '{}': {}", field, err);
                None
            }
        }
    }
}

/// One page of results plus the unpaginated total.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableData<T> {
    pub list: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}
