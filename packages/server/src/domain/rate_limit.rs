//! Fixed-window request counting per caller.
//!
//! Windows are opened by the first request of a caller and reset by the first
//! request after they elapse. Bursts straddling a window boundary can exceed
//! `max_requests` across the union of two windows.

use std::time::Duration;

/// Limits applied by the keyed limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window: Duration,
    /// Requests allowed per window; request `max_requests + 1` is denied
    pub max_requests: u32,
}

impl RateLimitPolicy {
    pub const fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
        }
    }

    fn window_millis(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(60), 100)
    }
}

/// Window state of one caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub window_start: i64,
    pub count: u32,
}

impl RateLimitEntry {
    /// Open a window for a caller's first request (which is allowed)
    pub fn open(now_millis: i64) -> Self {
        Self {
            window_start: now_millis,
            count: 1,
        }
    }

    /// Count one more request. Returns `false` when it must be denied.
    pub fn register(&mut self, now_millis: i64, policy: &RateLimitPolicy) -> bool {
        if self.is_expired(now_millis, policy) {
            *self = Self::open(now_millis);
            return true;
        }
        if self.count >= policy.max_requests {
            return false;
        }
        self.count += 1;
        true
    }

    pub fn is_expired(&self, now_millis: i64, policy: &RateLimitPolicy) -> bool {
        now_millis.saturating_sub(self.window_start) >= policy.window_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_requests: u32) -> RateLimitPolicy {
        RateLimitPolicy::new(Duration::from_secs(60), max_requests)
    }

    #[test]
    fn test_requests_within_limit_are_allowed() {
        // テスト項目: ウィンドウ内で上限までのリクエストは許可される
        // given (前提条件):
        let policy = policy(3);
        let mut entry = RateLimitEntry::open(0);

        // when (操作):
        let second = entry.register(10, &policy);
        let third = entry.register(20, &policy);

        // then (期待する結果):
        assert!(second);
        assert!(third);
        assert_eq!(entry.count, 3);
    }

    #[test]
    fn test_request_over_limit_is_denied() {
        // テスト項目: ウィンドウ内の (N+1) 件目のリクエストは拒否され、カウントは増えない
        // given (前提条件):
        let policy = policy(3);
        let mut entry = RateLimitEntry::open(0);
        entry.register(1, &policy);
        entry.register(2, &policy);

        // when (操作):
        let fourth = entry.register(3, &policy);

        // then (期待する結果):
        assert!(!fourth);
        assert_eq!(entry.count, 3);
    }

    #[test]
    fn test_window_reset_after_elapsed() {
        // テスト項目: ウィンドウ経過後の最初のリクエストは過去のカウントに関係なく許可される
        // given (前提条件):
        let policy = policy(1);
        let mut entry = RateLimitEntry::open(0);
        assert!(!entry.register(59_999, &policy));

        // when (操作):
        let after_window = entry.register(60_000, &policy);

        // then (期待する結果):
        assert!(after_window);
        assert_eq!(entry, RateLimitEntry::open(60_000));
    }
}
