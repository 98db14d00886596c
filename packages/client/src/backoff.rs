//! Reconnect backoff.
//!
//! Pure state, no timers: the caller sleeps for whatever `next_delay` hands out.

use std::time::Duration;

/// Exponential backoff parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub max_attempts: u32,
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (1-based): `base_delay × 2^(attempt−1)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1_000),
            max_attempts: 5,
        }
    }
}

/// Consecutive failed attempts since the last successful connect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackoffState {
    attempt: u32,
}

impl BackoffState {
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Count one more failure and return the delay before retrying.
    ///
    /// Returns `None` once the attempt counter exceeds `max_attempts`; no retry
    /// should be scheduled then.
    pub fn next_delay(&mut self, policy: &BackoffPolicy) -> Option<Duration> {
        self.attempt = self.attempt.saturating_add(1);
        (self.attempt <= policy.max_attempts).then(|| policy.delay_for(self.attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double_from_base() {
        // テスト項目: 1〜5 回目の再接続待ち時間が 1000, 2000, 4000, 8000, 16000ms になる
        // given (前提条件):
        let policy = BackoffPolicy::default();
        let mut state = BackoffState::default();

        // when (操作):
        let delays: Vec<Option<Duration>> = (0..5).map(|_| state.next_delay(&policy)).collect();

        // then (期待する結果):
        let expected: Vec<Option<Duration>> = [1_000, 2_000, 4_000, 8_000, 16_000]
            .into_iter()
            .map(|ms| Some(Duration::from_millis(ms)))
            .collect();
        assert_eq!(delays, expected);
        assert_eq!(state.attempt(), 5);
    }

    #[test]
    fn test_sixth_attempt_is_terminal() {
        // テスト項目: 上限を超えた 6 回目は待ち時間を返さない
        // given (前提条件):
        let policy = BackoffPolicy::default();
        let mut state = BackoffState::default();
        for _ in 0..5 {
            state.next_delay(&policy);
        }

        // when (操作):
        let result = state.next_delay(&policy);

        // then (期待する結果):
        assert_eq!(result, None);
        assert_eq!(state.attempt(), 6);
    }

    #[test]
    fn test_reset_starts_over_from_base_delay() {
        // テスト項目: リセット後は再び基準の待ち時間から始まる
        // given (前提条件):
        let policy = BackoffPolicy::default();
        let mut state = BackoffState::default();
        state.next_delay(&policy);
        state.next_delay(&policy);

        // when (操作):
        state.reset();
        let result = state.next_delay(&policy);

        // then (期待する結果):
        assert_eq!(result, Some(Duration::from_millis(1_000)));
    }

    #[test]
    fn test_large_attempt_saturates() {
        // テスト項目: 非常に大きな試行回数でもオーバーフローしない
        // given (前提条件):
        let policy = BackoffPolicy::default();

        // when (操作):
        let delay = policy.delay_for(u32::MAX);

        // then (期待する結果):
        assert!(delay >= Duration::from_millis(1_000));
    }
}
