//! Server configuration loaded from the environment.

use std::time::Duration;

use axum::http::HeaderValue;
use tracing::warn;

use studydash_core::defaults::{
    ALLOWED_ORIGINS, BCRYPT_COST, MAX_BODY_BYTES, RATE_LIMIT_PERIOD_SECS, RATE_LIMIT_REQUESTS,
    SERVER_PORT, SESSION_TTL_SECS, SESSION_TTL_SPEC,
};
use studydash_core::{Error, Result};

/// Everything the HTTP server reads from its environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// HS256 signing secret for session tokens.
    pub jwt_secret: String,
    /// Lifetime of an issued session token.
    pub session_ttl: Duration,
    /// Mark the session cookie `Secure`.
    pub cookie_secure: bool,
    pub bcrypt_cost: u32,
    pub allowed_origins: Vec<HeaderValue>,
    pub rate_limit_enabled: bool,
    pub rate_limit_requests: u64,
    pub rate_limit_period: Duration,
    /// Create the demo account on startup.
    pub demo_seed_enabled: bool,
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DATABASE_URL` | `postgres://localhost/studydash` | PostgreSQL connection string |
    /// | `HOST` | `0.0.0.0` | Bind address |
    /// | `PORT` | `4000` | Bind port |
    /// | `JWT_SECRET` | required | Session token signing secret |
    /// | `JWT_EXPIRES_IN` | `7d` | Token lifetime, `s`/`m`/`h`/`d` suffix |
    /// | `COOKIE_SECURE` | `false` | Send the cookie only over HTTPS |
    /// | `BCRYPT_COST` | `12` | Password hash work factor |
    /// | `ALLOWED_ORIGINS` | Vite dev server | Comma-separated CORS origins |
    /// | `RATE_LIMIT_ENABLED` | `true` | Throttle login and signup |
    /// | `RATE_LIMIT_REQUESTS` | `30` | Requests per period |
    /// | `RATE_LIMIT_PERIOD_SECS` | `60` | Rate limit period |
    /// | `DEMO_SEED_ENABLED` | `true` | Create the demo account on startup |
    pub fn from_env() -> Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::Config("JWT_SECRET must be set".to_string()))?;

        let session_ttl = match std::env::var("JWT_EXPIRES_IN") {
            Ok(spec) if !spec.trim().is_empty() => parse_ttl(&spec)?,
            _ => parse_ttl(SESSION_TTL_SPEC)?,
        };

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(SERVER_PORT);

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/studydash".to_string()),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            jwt_secret,
            session_ttl,
            cookie_secure: env_flag("COOKIE_SECURE", false),
            bcrypt_cost: std::env::var("BCRYPT_COST")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(BCRYPT_COST),
            allowed_origins: parse_allowed_origins(
                &std::env::var("ALLOWED_ORIGINS").unwrap_or_default(),
            ),
            rate_limit_enabled: env_flag("RATE_LIMIT_ENABLED", true),
            rate_limit_requests: std::env::var("RATE_LIMIT_REQUESTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(RATE_LIMIT_REQUESTS),
            rate_limit_period: Duration::from_secs(
                std::env::var("RATE_LIMIT_PERIOD_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(RATE_LIMIT_PERIOD_SECS),
            ),
            demo_seed_enabled: env_flag("DEMO_SEED_ENABLED", true),
            max_body_bytes: MAX_BODY_BYTES,
        })
    }

    /// Config for tests and embedding: defaults everywhere, the given secret.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: String::new(),
            host: "127.0.0.1".to_string(),
            port: SERVER_PORT,
            jwt_secret: jwt_secret.into(),
            session_ttl: Duration::from_secs(SESSION_TTL_SECS as u64),
            cookie_secure: false,
            bcrypt_cost: BCRYPT_COST,
            allowed_origins: parse_allowed_origins(ALLOWED_ORIGINS),
            rate_limit_enabled: false,
            rate_limit_requests: RATE_LIMIT_REQUESTS,
            rate_limit_period: Duration::from_secs(RATE_LIMIT_PERIOD_SECS),
            demo_seed_enabled: false,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    pub fn with_rate_limit(mut self, requests: u64, period: Duration) -> Self {
        self.rate_limit_enabled = true;
        self.rate_limit_requests = requests;
        self.rate_limit_period = period;
        self
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

/// Parse a token lifetime such as `7d`, `12h`, `30m`, `45s` or a bare
/// number of seconds.
pub fn parse_ttl(spec: &str) -> Result<Duration> {
    let spec = spec.trim();
    let invalid = || Error::Config(format!("Invalid JWT_EXPIRES_IN value '{}'", spec));

    let (digits, unit) = match spec.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&spec[..idx], c.to_ascii_lowercase()),
        Some(_) => (spec, 's'),
        None => return Err(invalid()),
    };
    let amount: u64 = digits.trim().parse().map_err(|_| invalid())?;
    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => return Err(invalid()),
    };
    if amount == 0 {
        return Err(invalid());
    }
    Ok(Duration::from_secs(amount * multiplier))
}

/// Parse a comma-separated origin list, falling back to the dev server
/// origins when empty.
pub fn parse_allowed_origins(origins: &str) -> Vec<HeaderValue> {
    let source = if origins.trim().is_empty() {
        ALLOWED_ORIGINS
    } else {
        origins
    };

    source
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}
