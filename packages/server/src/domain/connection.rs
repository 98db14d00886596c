//! Connection identity and bookkeeping.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// Opaque identity of one live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Attributes the registry keeps for each connection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    /// Remote identity (peer IP)
    pub remote: String,
    /// Unix timestamp when the handshake was accepted (UTC, milliseconds)
    pub connected_at: i64,
    /// Unix timestamp of the last inbound frame (UTC, milliseconds)
    pub last_activity: i64,
    /// Whether this connection may push inbound events
    pub can_publish: bool,
}

impl ConnectionInfo {
    pub fn new(remote: impl Into<String>, connected_at: i64, can_publish: bool) -> Self {
        Self {
            id: ConnectionId::generate(),
            remote: remote.into(),
            connected_at,
            last_activity: connected_at,
            can_publish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_connection_starts_with_last_activity_at_connect_time() {
        // テスト項目: 新規接続の last_activity は接続時刻で初期化される
        // given (前提条件):
        let connected_at = 1_700_000_000_000;

        // when (操作):
        let info = ConnectionInfo::new("127.0.0.1", connected_at, true);

        // then (期待する結果):
        assert_eq!(info.last_activity, connected_at);
        assert_eq!(info.remote, "127.0.0.1");
    }

    #[test]
    fn test_connection_ids_are_unique() {
        // テスト項目: 接続ごとに異なる ConnectionId が割り当てられる
        // given (前提条件):
        let a = ConnectionInfo::new("10.0.0.1", 0, true);

        // when (操作):
        let b = ConnectionInfo::new("10.0.0.1", 0, true);

        // then (期待する結果):
        assert_ne!(a.id, b.id);
    }
}
