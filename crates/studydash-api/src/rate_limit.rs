//! Global throttle for the credential endpoints.

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tracing::warn;

use studydash_core::{Error, Result};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::AppState;

pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// `None` when rate limiting is disabled.
pub fn build_rate_limiter(config: &ServerConfig) -> Result<Option<Arc<GlobalRateLimiter>>> {
    if !config.rate_limit_enabled {
        return Ok(None);
    }
    let burst = u32::try_from(config.rate_limit_requests)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or_else(|| Error::Config("RATE_LIMIT_REQUESTS must be between 1 and 2^32-1".to_string()))?;
    let quota = Quota::with_period(config.rate_limit_period)
        .ok_or_else(|| Error::Config("RATE_LIMIT_PERIOD_SECS must be non-zero".to_string()))?
        .allow_burst(burst);
    Ok(Some(Arc::new(RateLimiter::direct(quota))))
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            warn!(
                subsystem = "api",
                component = "rate_limit",
                path = %request.uri().path(),
                "Rate limit exceeded"
            );
            return Err(ApiError::TooManyRequests(
                "Too many requests. Please wait before retrying.".to_string(),
            ));
        }
    }
    Ok(next.run(request).await)
}
