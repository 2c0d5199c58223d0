//! Error type for the DuckDB storage layer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DuckdbError {
    /// DuckDB database error
    #[error("DuckDB error: {0}")]
    Database(#[from] duckdb::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Query timeout
    #[error("Query timeout after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Migration failed
    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },
}
