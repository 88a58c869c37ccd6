//! Application-wide constants
//!
//! This module contains all constant values used throughout the application.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default log filter when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

/// How long a request waits for a pooled connection, in seconds
pub const DATABASE_ACQUIRE_TIMEOUT_SECONDS: u64 = 5;

// =============================================================================
// JUDGE DEFAULTS
// =============================================================================

/// Default endpoint of the external execution engine
pub const DEFAULT_JUDGE_URL: &str = "http://code-executor:8001/execute";

/// Deadline for a single judge call, in seconds
pub const DEFAULT_JUDGE_TIMEOUT_SECONDS: u64 = 30;

/// Connect timeout towards the judge, in seconds
pub const DEFAULT_JUDGE_CONNECT_TIMEOUT_SECONDS: u64 = 5;

/// Maximum number of judge calls in flight at once
pub const DEFAULT_JUDGE_MAX_CONCURRENCY: usize = 8;

/// Longest a submission waits for a free judge slot, in seconds.
/// Together with the call deadline this stays below the stale window.
pub const DEFAULT_JUDGE_QUEUE_TIMEOUT_SECONDS: u64 = 120;

/// Largest judge response body read before the call is a protocol error (4 MiB)
pub const MAX_JUDGE_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

/// Maximum number of response body bytes echoed into a diagnostic
pub const JUDGE_DIAGNOSTIC_BODY_LIMIT: usize = 512;

// =============================================================================
// RECOVERY DEFAULTS
// =============================================================================

/// Age after which a non-terminal submission is considered stranded
pub const DEFAULT_STALE_SUBMISSION_SECONDS: u64 = 300;

/// How often the stale-submission sweeper runs
pub const DEFAULT_STALE_SWEEP_INTERVAL_SECONDS: u64 = 60;

/// Diagnostic written onto submissions closed by the sweeper
pub const STALE_SUBMISSION_MESSAGE: &str =
    "Grading did not complete; the submission was closed by the recovery sweeper";

// =============================================================================
// SUBMISSION LIMITS
// =============================================================================

/// Minimum source code size in bytes
pub const MIN_SOURCE_CODE_SIZE: u64 = 10;

/// Maximum source code size in bytes (64 KB)
pub const MAX_SOURCE_CODE_SIZE: u64 = 65536;

/// Maximum accepted request body, leaving room for JSON escaping of the source
pub const MAX_REQUEST_BODY_SIZE: usize = 256 * 1024;

// =============================================================================
// API VERSIONING
// =============================================================================

/// API base path
pub const API_BASE_PATH: &str = "/api/v1";

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for paginated results
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Maximum page size for paginated results
pub const MAX_PAGE_SIZE: u32 = 100;
