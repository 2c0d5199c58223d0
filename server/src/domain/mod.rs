//! Domain logic: span enrichment, trace tree assembly and aggregation

pub mod aggregate;
pub mod extract;
pub mod tree;
