// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display and platform directories)
pub const APP_NAME: &str = "AgentLens";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "agentlens";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".agentlens";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "agentlens.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "AGENTLENS_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "AGENTLENS_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "AGENTLENS_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "AGENTLENS_LOG";

/// Environment variable to override data directory
pub const ENV_DATA_DIR: &str = "AGENTLENS_DATA_DIR";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5533;

/// Graceful shutdown timeout in seconds
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// DuckDB Database
// =============================================================================

/// DuckDB database filename
pub const DUCKDB_DB_FILENAME: &str = "agentlens.duckdb";

/// DuckDB query timeout in seconds
pub const DUCKDB_QUERY_TIMEOUT_SECS: u64 = 30;

/// DuckDB checkpoint interval in seconds
pub const DUCKDB_CHECKPOINT_INTERVAL_SECS: u64 = 300;

// =============================================================================
// Table Queries
// =============================================================================

/// Smallest accepted page size
pub const MIN_PAGE_SIZE: u32 = 10;

/// Largest accepted page size
pub const MAX_PAGE_SIZE: u32 = 500;

/// Page size when the request does not specify one
pub const DEFAULT_PAGE_SIZE: u32 = 50;

// =============================================================================
// Model Invocations
// =============================================================================

/// Operation names that count as model invocations
pub const CHAT_OPERATIONS: &[&str] = &["chat", "chat_model"];
