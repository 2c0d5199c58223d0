//! Descendant closure aggregation

use std::collections::{HashMap, VecDeque};

use crate::data::types::span::SpanRow;

/// Aggregates over a span and all of its transitive descendants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosureStats {
    pub span_count: u64,
    /// Sum of token counts across spans that report them; `None` when no
    /// span in the closure does.
    pub total_tokens: Option<i64>,
}

/// Walk the descendant closure of `rep_span_id` within one trace's spans.
///
/// The count includes the representative itself. Parent links are resolved
/// by span id; spans not reachable from the representative contribute
/// nothing.
pub fn descendant_stats(spans: &[SpanRow], rep_span_id: &str) -> ClosureStats {
    let mut by_parent: HashMap<&str, Vec<&SpanRow>> = HashMap::new();
    for span in spans {
        if let Some(parent) = span.parent_span_id.as_deref()
            && !parent.is_empty()
            && parent != span.span_id
        {
            by_parent.entry(parent).or_default().push(span);
        }
    }

    let Some(rep) = spans.iter().find(|s| s.span_id == rep_span_id) else {
        return ClosureStats::default();
    };

    let mut stats = ClosureStats::default();
    let mut queue: VecDeque<&SpanRow> = VecDeque::from([rep]);
    while let Some(span) = queue.pop_front() {
        stats.span_count += 1;
        if let Some(tokens) = span.total_tokens {
            stats.total_tokens = Some(stats.total_tokens.unwrap_or(0) + tokens);
        }
        if let Some(kids) = by_parent.get(span.span_id.as_str()) {
            queue.extend(kids.iter().copied());
        }
    }
    stats
}
