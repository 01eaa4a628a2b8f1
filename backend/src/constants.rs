// =============================================================================
// Scheduler Backend Constants
// =============================================================================
// This file contains all constants used throughout the backend to enable
// easy tuning and configuration from a single location.

// =============================================================================
// AVAILABILITY BLOCKS
// =============================================================================

/// Length of one canonical availability block, in minutes
pub const BLOCK_MINUTES: i64 = 15;

/// Length of one canonical availability block, in seconds
pub const BLOCK_SECONDS: i64 = BLOCK_MINUTES * 60;

/// Most blocks a single create or update may submit (one leap year)
pub const MAX_BLOCKS_PER_REQUEST: usize = 366 * 24 * 4;

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

/// Default port for the HTTP server
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default tracing filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "scheduler=info,tower_http=debug,server=debug,migrate=info";

// =============================================================================
// DATABASE CONFIGURATION
// =============================================================================

/// Default size of the Postgres connection pool
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// How long a request waits for a pooled connection before failing
pub const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Per-statement timeout applied to every pooled connection
pub const DEFAULT_DB_STATEMENT_TIMEOUT_MS: u64 = 5_000;

// =============================================================================
// PRINCIPAL HEADERS
// =============================================================================
// Set by the authenticating gateway in front of this service once the
// bearer token has been verified.

/// Verified user ID of the caller
pub const USER_ID_HEADER: &str = "x-user-id";

/// Organization the caller belongs to
pub const ORG_ID_HEADER: &str = "x-org-id";

/// Account role of the caller (admin, tutor, student)
pub const USER_ROLE_HEADER: &str = "x-user-role";
