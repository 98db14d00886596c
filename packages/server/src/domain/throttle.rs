//! Per-connection minimum-interval throttle.

/// Honors at most one request per `min_interval_ms`. Requests inside the
/// interval are dropped without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalThrottle {
    min_interval_ms: i64,
    last_honored: Option<i64>,
}

impl IntervalThrottle {
    pub fn new(min_interval_ms: i64) -> Self {
        Self {
            min_interval_ms,
            last_honored: None,
        }
    }

    /// Returns `true` and records `now_millis` if the request should be honored
    pub fn try_acquire(&mut self, now_millis: i64) -> bool {
        match self.last_honored {
            Some(last) if now_millis - last < self.min_interval_ms => false,
            _ => {
                self.last_honored = Some(now_millis);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request_is_honored() {
        // テスト項目: 最初のリクエストは常に受け付けられる
        // given (前提条件):
        let mut throttle = IntervalThrottle::new(1_000);

        // when (操作):
        let result = throttle.try_acquire(0);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_request_inside_interval_is_ignored() {
        // テスト項目: 間隔内（200ms 後）のリクエストは無視される
        // given (前提条件):
        let mut throttle = IntervalThrottle::new(1_000);
        throttle.try_acquire(5_000);

        // when (操作):
        let result = throttle.try_acquire(5_200);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_ignored_request_does_not_extend_interval() {
        // テスト項目: 無視されたリクエストは次の受付時刻を後ろにずらさない
        // given (前提条件):
        let mut throttle = IntervalThrottle::new(1_000);
        throttle.try_acquire(0);
        throttle.try_acquire(900);

        // when (操作):
        let result = throttle.try_acquire(1_000);

        // then (期待する結果):
        assert!(result);
    }
}
