//! Autosave and seeding configuration.

use std::time::Duration;

use studydash_core::defaults::{
    AUTOSAVE_DEBOUNCE_MS, AUTOSAVE_MAX_RETRIES, AUTOSAVE_RETRY_BASE_MS, AUTOSAVE_RETRY_MAX_MS,
    DEMO_EMAIL, SYNC_EVENT_CAPACITY,
};
use studydash_core::GradeScale;

/// Configuration for the sync engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Quiet period after the last mutation before a save.
    pub debounce: Duration,
    /// Delay before the first retry of a failed save; doubles per attempt.
    pub retry_base: Duration,
    /// Upper bound for the retry delay.
    pub retry_max: Duration,
    /// Retries after a failed save before giving up until the next mutation.
    pub max_retries: u32,
    /// The one account that receives the demo fixture.
    pub demo_email: String,
    /// Capacity of the [`crate::SyncEvent`] broadcast channel.
    pub event_capacity: usize,
    /// Scale used by the store's GPA accessors.
    pub grade_scale: GradeScale,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(AUTOSAVE_DEBOUNCE_MS),
            retry_base: Duration::from_millis(AUTOSAVE_RETRY_BASE_MS),
            retry_max: Duration::from_millis(AUTOSAVE_RETRY_MAX_MS),
            max_retries: AUTOSAVE_MAX_RETRIES,
            demo_email: DEMO_EMAIL.to_string(),
            event_capacity: SYNC_EVENT_CAPACITY,
            grade_scale: GradeScale::default(),
        }
    }
}

fn env_millis(name: &str, default: u64) -> Duration {
    let ms = std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default);
    Duration::from_millis(ms)
}

impl SyncConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SYNC_DEBOUNCE_MS` | `500` | Autosave debounce |
    /// | `SYNC_RETRY_BASE_MS` | `1000` | First retry delay |
    /// | `SYNC_RETRY_MAX_MS` | `30000` | Retry delay cap |
    /// | `SYNC_MAX_RETRIES` | `5` | Retries per failed save |
    /// | `DEMO_EMAIL` | `demo@university.edu` | Account that gets the demo fixture |
    /// | `GRADE_SCALE` | `ten_point` | `ten_point` or `four_point` |
    pub fn from_env() -> Self {
        let max_retries = std::env::var("SYNC_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(AUTOSAVE_MAX_RETRIES);

        let demo_email = std::env::var("DEMO_EMAIL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEMO_EMAIL.to_string());

        let grade_scale = match std::env::var("GRADE_SCALE").as_deref() {
            Ok("four_point") => GradeScale::FourPoint,
            _ => GradeScale::TenPoint,
        };

        Self {
            debounce: env_millis("SYNC_DEBOUNCE_MS", AUTOSAVE_DEBOUNCE_MS),
            retry_base: env_millis("SYNC_RETRY_BASE_MS", AUTOSAVE_RETRY_BASE_MS),
            retry_max: env_millis("SYNC_RETRY_MAX_MS", AUTOSAVE_RETRY_MAX_MS),
            max_retries,
            demo_email,
            event_capacity: SYNC_EVENT_CAPACITY,
            grade_scale,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, base: Duration, max: Duration, max_retries: u32) -> Self {
        self.retry_base = base;
        self.retry_max = max;
        self.max_retries = max_retries;
        self
    }

    pub fn with_demo_email(mut self, email: impl Into<String>) -> Self {
        self.demo_email = email.into();
        self
    }

    pub fn with_grade_scale(mut self, scale: GradeScale) -> Self {
        self.grade_scale = scale;
        self
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`,
    /// capped at `retry_max`.
    pub fn retry_delay(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.retry_base
            .checked_mul(factor)
            .unwrap_or(self.retry_max)
            .min(self.retry_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.debounce, Duration::from_millis(500));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.demo_email, DEMO_EMAIL);
    }

    #[test]
    fn test_retry_delay_doubles_then_caps() {
        let config = SyncConfig::default();
        assert_eq!(config.retry_delay(1), Duration::from_secs(1));
        assert_eq!(config.retry_delay(2), Duration::from_secs(2));
        assert_eq!(config.retry_delay(5), Duration::from_secs(16));
        assert_eq!(config.retry_delay(6), Duration::from_secs(30));
        assert_eq!(config.retry_delay(40), Duration::from_secs(30));
    }

    #[test]
    fn test_builders() {
        let config = SyncConfig::default()
            .with_debounce(Duration::from_millis(50))
            .with_retry(Duration::from_millis(10), Duration::from_millis(40), 2)
            .with_demo_email("demo@example.edu");
        assert_eq!(config.debounce, Duration::from_millis(50));
        assert_eq!(config.retry_delay(3), Duration::from_millis(40));
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.demo_email, "demo@example.edu");
    }
}
