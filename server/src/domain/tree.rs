//! Trace tree assembly
//!
//! Turns the flat span list of a trace into a forest of parent/child
//! nodes. Spans whose parent is absent from the trace (or is themselves)
//! are promoted to roots so no span is ever dropped from the view.

use serde::Serialize;

use crate::data::types::span::SpanRow;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceNode {
    #[serde(flatten)]
    pub span: SpanRow,
    pub children: Vec<TraceNode>,
}

/// Build the span forest for one trace.
///
/// `spans` is expected in (start_time, span_id) order from storage; child
/// order inherits it. Every input span appears in the output exactly once.
pub fn build_tree(spans: Vec<SpanRow>) -> Vec<TraceNode> {
    let index: std::collections::HashMap<&str, usize> = spans
        .iter()
        .enumerate()
        .map(|(i, s)| (s.span_id.as_str(), i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); spans.len()];
    let mut roots: Vec<usize> = Vec::new();
    for (i, span) in spans.iter().enumerate() {
        let parent = span
            .parent_span_id
            .as_deref()
            .filter(|p| !p.is_empty() && *p != span.span_id)
            .and_then(|p| index.get(p).copied());
        match parent {
            Some(p) => children[p].push(i),
            None => roots.push(i),
        }
    }

    let mut slots: Vec<Option<SpanRow>> = spans.into_iter().map(Some).collect();
    roots
        .iter()
        .map(|&r| take_node(r, &children, &mut slots))
        .collect()
}

fn take_node(i: usize, children: &[Vec<usize>], slots: &mut [Option<SpanRow>]) -> TraceNode {
    // Each index is reachable from exactly one parent (or the root list),
    // so every slot is taken at most once.
    let span = slots[i].take().expect("span visited twice");
    let child_nodes = children[i]
        .iter()
        .map(|&c| take_node(c, children, slots))
        .collect();
    TraceNode {
        span,
        children: child_nodes,
    }
}
