//! DuckDB repositories: one module per query surface

pub mod model;
pub mod span;
pub mod stats;
pub mod trace;
