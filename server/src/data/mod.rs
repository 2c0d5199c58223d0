//! Data layer: storage backends and shared data types

pub mod duckdb;
pub mod types;
