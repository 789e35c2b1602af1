//! Centralized default constants for studydash.
//!
//! Server, database and sync crates reference these constants instead of
//! defining their own magic numbers.

// =============================================================================
// ACCOUNTS
// =============================================================================

/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Minimum trimmed display-name length accepted at signup.
pub const MIN_NAME_LEN: usize = 2;

/// Department stored when none (or a blank one) is supplied.
pub const DEFAULT_DEPARTMENT: &str = "Not Specified";

/// Number of leading name characters used for the avatar initials.
pub const AVATAR_LEN: usize = 2;

/// bcrypt work factor for new password hashes.
pub const BCRYPT_COST: u32 = 12;

// =============================================================================
// SESSION
// =============================================================================

/// Name of the HTTP-only session cookie.
pub const SESSION_COOKIE: &str = "auth_token";

/// Session lifetime (cookie Max-Age and default token expiry), in seconds.
pub const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Default `JWT_EXPIRES_IN` value.
pub const SESSION_TTL_SPEC: &str = "7d";

// =============================================================================
// DEMO ACCOUNT
// =============================================================================

/// Email that distinguishes the demo account. Nothing else marks it.
pub const DEMO_EMAIL: &str = "demo@university.edu";

/// Demo account password created by the server bootstrap.
pub const DEMO_PASSWORD: &str = "demo123";

/// Demo account display name.
pub const DEMO_NAME: &str = "Demo Student";

/// Demo account student id.
pub const DEMO_STUDENT_ID: &str = "STU2024001";

/// Demo account department.
pub const DEMO_DEPARTMENT: &str = "Computer Science";

/// Version stamped into `seedVersion` when the demo fixtures are written.
/// Bump when the fixture set changes so existing demo documents reseed.
pub const DEMO_SEED_VERSION: u32 = 1;

/// Legacy "incomplete demo document" thresholds, used only for documents
/// written before `seedVersion` existed.
pub const DEMO_MIN_COURSES: usize = 48;
pub const DEMO_MIN_EVENTS: usize = 60;
pub const DEMO_MIN_MIND_SPACE_ITEMS: usize = 60;
pub const DEMO_MIN_GRADES: usize = 48;
pub const DEMO_MIN_FILES: usize = 48;

// =============================================================================
// AUTOSAVE
// =============================================================================

/// Debounce window between the last mutation and the autosave PUT.
pub const AUTOSAVE_DEBOUNCE_MS: u64 = 500;

/// First retry delay after a failed autosave.
pub const AUTOSAVE_RETRY_BASE_MS: u64 = 1_000;

/// Upper bound for the exponential retry delay.
pub const AUTOSAVE_RETRY_MAX_MS: u64 = 30_000;

/// Retries attempted after the initial failed save.
pub const AUTOSAVE_MAX_RETRIES: u32 = 5;

/// Capacity of the sync event broadcast channel.
pub const SYNC_EVENT_CAPACITY: usize = 64;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 4000;

/// Default rate limit on credential endpoints: max requests per period.
pub const RATE_LIMIT_REQUESTS: u64 = 30;

/// Default rate limit: period in seconds.
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;

/// Maximum accepted request body. Files are embedded as base64 data URLs,
/// so whole documents can be large.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Default CORS origins (the Vite dev server).
pub const ALLOWED_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ttl_is_seven_days() {
        assert_eq!(SESSION_TTL_SECS, 604_800);
    }

    #[test]
    fn test_retry_bounds_are_ordered() {
        assert!(AUTOSAVE_RETRY_BASE_MS <= AUTOSAVE_RETRY_MAX_MS);
        assert!(AUTOSAVE_DEBOUNCE_MS < AUTOSAVE_RETRY_BASE_MS);
    }
}
