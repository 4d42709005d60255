use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_STATS_INTERVAL_SECS: u32 = 5;

/// How often server statistics are polled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RefreshPolicy {
    Manual,
    Interval { every_secs: u32 },
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        RefreshPolicy::Interval {
            every_secs: DEFAULT_STATS_INTERVAL_SECS,
        }
    }
}

impl RefreshPolicy {
    pub fn every_secs(self) -> Option<u32> {
        match self {
            RefreshPolicy::Manual => None,
            RefreshPolicy::Interval { every_secs } => Some(every_secs),
        }
    }

    /// Poll period; `None` for manual refresh or a zero interval.
    pub fn duration(self) -> Option<Duration> {
        self.every_secs()
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(secs as u64))
    }

    pub fn label(self) -> String {
        match self {
            RefreshPolicy::Manual => "Off".to_string(),
            RefreshPolicy::Interval { every_secs } => format!("{}s", every_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_polls_every_five_seconds() {
        assert_eq!(RefreshPolicy::default().duration(), Some(Duration::from_secs(5)));
        assert_eq!(RefreshPolicy::default().label(), "5s");
    }

    #[test]
    fn manual_and_zero_interval_never_poll() {
        assert_eq!(RefreshPolicy::Manual.duration(), None);
        assert_eq!(RefreshPolicy::Interval { every_secs: 0 }.duration(), None);
        assert_eq!(RefreshPolicy::Manual.label(), "Off");
    }

    #[test]
    fn serializes_with_mode_tag() {
        let json = serde_json::to_string(&RefreshPolicy::Interval { every_secs: 10 }).unwrap();
        assert_eq!(json, r#"{"mode":"interval","every_secs":10}"#);

        let manual: RefreshPolicy = serde_json::from_str(r#"{"mode":"manual"}"#).unwrap();
        assert_eq!(manual, RefreshPolicy::Manual);
    }
}
