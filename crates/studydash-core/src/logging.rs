//! Structured logging field name constants for studydash.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log queries can filter on the same names across the server and the
//! sync client.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue (failed autosave, rejected token) |
//! | INFO  | Lifecycle events (startup, login, document loaded/seeded) |
//! | DEBUG | Decision points (debounce restarts, skipped saves, stale loads) |
//! | TRACE | Per-mutation detail |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the `x-request-id` header.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "sync"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "auth", "data", "pool", "autosave", "loader"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "login", "signup", "upsert", "save", "load"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// User UUID being operated on.
pub const USER_ID: &str = "user_id";

/// Store revision being saved or observed.
pub const REVISION: &str = "revision";

/// Number of items in a collection.
pub const ITEM_COUNT: &str = "item_count";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Retry attempt number (1-based).
pub const ATTEMPT: &str = "attempt";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

/// Database table affected.
pub const DB_TABLE: &str = "db_table";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
