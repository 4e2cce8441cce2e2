use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::errors::AppError;

#[derive(Clone, Debug)]
struct RateLimitEntry {
    count: u32,
    window_start: DateTime<Utc>,
}

/// Fixed-window rate limiter keyed by an arbitrary string (for login, the
/// submitted email).
pub struct RateLimiter {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
    max_requests: u32,
    window_seconds: i64,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_seconds: i64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_requests,
            window_seconds,
        }
    }

    /// Returns Ok(()) if allowed, Err if the key exceeded its window budget.
    pub fn check(&self, key: &str) -> Result<(), AppError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Internal("Failed to acquire rate limiter lock".into()))?;

        let now = Utc::now();
        let window = Duration::seconds(self.window_seconds);

        let entry = entries.entry(key.to_string()).or_insert(RateLimitEntry {
            count: 0,
            window_start: now,
        });

        if now >= entry.window_start + window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;

        if entry.count > self.max_requests {
            let retry_after = (entry.window_start + window - now).num_seconds().max(0);
            return Err(AppError::Forbidden(format!(
                "Too many attempts. Try again in {} seconds.",
                retry_after
            )));
        }

        Ok(())
    }
}

lazy_static::lazy_static! {
    /// Login attempts: 5 per 5 minutes per email.
    pub static ref LOGIN_LIMIT: RateLimiter = RateLimiter::new(5, 300);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(3, 60);
        for _ in 0..3 {
            assert!(limiter.check("a@example.com").is_ok());
        }
        assert!(limiter.check("a@example.com").is_err());
        // Other keys are unaffected
        assert!(limiter.check("b@example.com").is_ok());
    }
}
