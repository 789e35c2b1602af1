//! Postgres pool for the dashboard server.
//!
//! The server does one short query per request (a user lookup or a single
//! document row), so the pool stays small. The acquire timeout is the only
//! timeout applied on the server side.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};

use studydash_core::{Error, Result};

/// Connections kept open at most.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Seconds a request waits for a free connection before failing.
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Idle connections above `min_connections` are closed after this long.
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Pool sizing read from `DB_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        }
    }
}

impl PoolSettings {
    /// | Variable | Default |
    /// |----------|---------|
    /// | `DB_MAX_CONNECTIONS` | `10` |
    /// | `DB_MIN_CONNECTIONS` | `1` |
    /// | `DB_ACQUIRE_TIMEOUT_SECS` | `30` |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source. Unparseable values
    /// are logged and replaced by the default; `min` is clamped to `max`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| -> Option<u64> {
            let raw = lookup(key)?;
            match raw.trim().parse::<u64>() {
                Ok(n) => Some(n),
                Err(_) => {
                    warn!(variable = key, value = %raw, "Ignoring invalid pool setting");
                    None
                }
            }
        };

        let mut settings = Self::default();
        if let Some(n) = read("DB_MAX_CONNECTIONS").filter(|n| *n > 0) {
            settings.max_connections = u32::try_from(n).unwrap_or(u32::MAX);
        }
        if let Some(n) = read("DB_MIN_CONNECTIONS") {
            settings.min_connections = u32::try_from(n).unwrap_or(u32::MAX);
        }
        if let Some(secs) = read("DB_ACQUIRE_TIMEOUT_SECS") {
            settings.acquire_timeout = Duration::from_secs(secs);
        }
        settings.min_connections = settings.min_connections.min(settings.max_connections);
        settings
    }

    fn options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(IDLE_TIMEOUT)
    }
}

/// Open the pool, logging how long the first connections took.
pub async fn connect_pool(database_url: &str, settings: &PoolSettings) -> Result<PgPool> {
    let start = Instant::now();
    info!(
        subsystem = "db",
        component = "pool",
        max_connections = settings.max_connections,
        min_connections = settings.min_connections,
        acquire_timeout_secs = settings.acquire_timeout.as_secs(),
        "Opening database pool"
    );

    let pool = settings
        .options()
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "pool",
        pool_size = pool.size(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Database pool ready"
    );
    Ok(pool)
}

/// Log open and idle connection counts; warns when every connection is busy.
pub fn log_pool_state(pool: &PgPool) {
    let size = pool.size();
    let idle = pool.num_idle();
    if idle == 0 && size > 0 {
        warn!(
            subsystem = "db",
            component = "pool",
            pool_size = size,
            "No idle database connections"
        );
    } else {
        info!(
            subsystem = "db",
            component = "pool",
            pool_size = size,
            pool_idle = idle,
            "Pool state"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(PoolSettings::from_lookup(lookup(&[])), PoolSettings::default());
    }

    #[test]
    fn test_reads_overrides() {
        let settings = PoolSettings::from_lookup(lookup(&[
            ("DB_MAX_CONNECTIONS", "20"),
            ("DB_MIN_CONNECTIONS", "4"),
            ("DB_ACQUIRE_TIMEOUT_SECS", " 5 "),
        ]));
        assert_eq!(settings.max_connections, 20);
        assert_eq!(settings.min_connections, 4);
        assert_eq!(settings.acquire_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let settings = PoolSettings::from_lookup(lookup(&[
            ("DB_MAX_CONNECTIONS", "0"),
            ("DB_ACQUIRE_TIMEOUT_SECS", "soon"),
        ]));
        assert_eq!(settings.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(
            settings.acquire_timeout,
            Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_min_clamped_to_max() {
        let settings = PoolSettings::from_lookup(lookup(&[
            ("DB_MAX_CONNECTIONS", "3"),
            ("DB_MIN_CONNECTIONS", "8"),
        ]));
        assert_eq!(settings.min_connections, 3);
    }
}
