use crate::error::ConsoleError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Server statistics as reported by the stats endpoint.
///
/// A disconnected server answers with only `connected: false` (and maybe
/// an `error`), so every counter has a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerStats {
    pub connected: bool,
    #[serde(default)]
    pub keys_count: u64,
    /// Human-readable label such as `"1.02M"`.
    #[serde(default = "unknown_memory", deserialize_with = "label_or_number")]
    pub used_memory: String,
    #[serde(default)]
    pub connected_clients: u64,
    #[serde(default)]
    pub ops_per_sec: u64,
    #[serde(default)]
    pub hits: u64,
    #[serde(default)]
    pub misses: u64,
    #[serde(default)]
    pub uptime: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn unknown_memory() -> String {
    "N/A".to_string()
}

fn label_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(label) => label,
        JsonValue::Null => unknown_memory(),
        other => other.to_string(),
    })
}

impl ServerStats {
    pub fn connected() -> Self {
        Self {
            connected: true,
            used_memory: unknown_memory(),
            ..Self::default()
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            used_memory: unknown_memory(),
            ..Self::default()
        }
    }

    /// Keyspace hit rate as a percentage, `None` before any lookups.
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.hits.saturating_add(self.misses);
        if total == 0 {
            return None;
        }
        Some(self.hits as f64 / total as f64 * 100.0)
    }

    pub fn hit_rate_label(&self) -> String {
        format!("{:.1}%", self.hit_rate().unwrap_or(0.0))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Unknown => "Checking...",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
        }
    }
}

/// Issued when a stats poll starts; the poll's result is applied with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StatsTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum StatsUpdate {
    /// An answer to an older poll arrived after a newer one; ignored.
    Stale,
    Refreshed,
    Reconnected,
    ConnectionLost,
    StillDisconnected,
    FetchFailed(String),
}

/// Latest server statistics plus the connection state derived from them.
#[derive(Debug, Default)]
pub struct StatsTracker {
    next_seq: u64,
    last_applied: Option<u64>,
    latest: Option<ServerStats>,
    status: ConnectionStatus,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> StatsTicket {
        let ticket = StatsTicket(self.next_seq);
        self.next_seq += 1;
        ticket
    }

    pub fn latest(&self) -> Option<&ServerStats> {
        self.latest.as_ref()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn apply(
        &mut self,
        ticket: StatsTicket,
        result: Result<ServerStats, ConsoleError>,
    ) -> StatsUpdate {
        if self.last_applied.is_some_and(|last| ticket.0 <= last) {
            log::debug!("Dropping stale stats response #{}", ticket.0);
            return StatsUpdate::Stale;
        }
        self.last_applied = Some(ticket.0);

        let stats = match result {
            Ok(stats) => stats,
            Err(e) => {
                log::warn!("Stats poll #{} failed: {}", ticket.0, e);
                return StatsUpdate::FetchFailed(e.to_string());
            }
        };

        let previous = self.status;
        let connected = stats.connected;
        self.latest = Some(stats);

        if connected {
            self.status = ConnectionStatus::Connected;
            if previous == ConnectionStatus::Disconnected {
                log::info!("Connection restored");
                StatsUpdate::Reconnected
            } else {
                StatsUpdate::Refreshed
            }
        } else {
            self.status = ConnectionStatus::Disconnected;
            log::warn!("Server reports no connection to the store");
            if previous == ConnectionStatus::Disconnected {
                StatsUpdate::StillDisconnected
            } else {
                StatsUpdate::ConnectionLost
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(keys: u64) -> ServerStats {
        ServerStats {
            keys_count: keys,
            ..ServerStats::connected()
        }
    }

    #[test]
    fn deserializes_disconnected_response() {
        let parsed: ServerStats =
            serde_json::from_str(r#"{"connected": false, "error": "refused"}"#).unwrap();
        assert!(!parsed.connected);
        assert_eq!(parsed.used_memory, "N/A");
        assert_eq!(parsed.error.as_deref(), Some("refused"));
    }

    #[test]
    fn used_memory_accepts_numbers() {
        let json = r#"{"connected": true, "used_memory": 1024, "hits": 3, "misses": 1}"#;
        let parsed: ServerStats = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.used_memory, "1024");
        assert_eq!(parsed.hit_rate_label(), "75.0%");
    }

    #[test]
    fn hit_rate_without_lookups() {
        assert_eq!(ServerStats::connected().hit_rate(), None);
        assert_eq!(ServerStats::connected().hit_rate_label(), "0.0%");
    }

    #[test]
    fn hit_rate_saturates_huge_counters() {
        let mut stats = ServerStats::connected();
        stats.hits = u64::MAX;
        stats.misses = 1;
        assert_eq!(stats.hit_rate_label(), "100.0%");
    }

    #[test]
    fn late_responses_are_dropped() {
        let mut tracker = StatsTracker::new();
        let older = tracker.begin();
        let newer = tracker.begin();

        assert_eq!(tracker.apply(newer, Ok(stats(20))), StatsUpdate::Refreshed);
        assert_eq!(tracker.apply(older, Ok(stats(10))), StatsUpdate::Stale);
        assert_eq!(tracker.latest().map(|s| s.keys_count), Some(20));
    }

    #[test]
    fn connection_loss_is_reported_once() {
        let mut tracker = StatsTracker::new();

        let t = tracker.begin();
        assert_eq!(tracker.apply(t, Ok(stats(1))), StatsUpdate::Refreshed);
        let t = tracker.begin();
        assert_eq!(
            tracker.apply(t, Ok(ServerStats::disconnected())),
            StatsUpdate::ConnectionLost
        );
        let t = tracker.begin();
        assert_eq!(
            tracker.apply(t, Ok(ServerStats::disconnected())),
            StatsUpdate::StillDisconnected
        );
        let t = tracker.begin();
        assert_eq!(tracker.apply(t, Ok(stats(1))), StatsUpdate::Reconnected);
        assert_eq!(tracker.status(), ConnectionStatus::Connected);
    }

    #[test]
    fn fetch_failure_keeps_last_stats() {
        let mut tracker = StatsTracker::new();
        let t = tracker.begin();
        tracker.apply(t, Ok(stats(5)));

        let t = tracker.begin();
        let update = tracker.apply(t, Err(ConsoleError::request_failed("timeout")));
        assert!(matches!(update, StatsUpdate::FetchFailed(_)));
        assert_eq!(tracker.latest().map(|s| s.keys_count), Some(5));
    }
}
