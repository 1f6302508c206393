// ABOUTME: Tunable bounds for the inspector's message history and request timeout
// ABOUTME: Loaded from the optional "inspector" config section and overridable from the CLI

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shortest accepted request timeout; zero would expire every request on arrival.
pub const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// History and timeout bounds applied to every server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InspectorSettings {
    /// Maximum entries kept per server before the oldest is evicted
    pub history_capacity: usize,

    /// How long a request may stay pending before it is marked timed out
    #[serde(rename = "requestTimeoutSecs", with = "duration_secs")]
    pub request_timeout: Duration,
}

impl Default for InspectorSettings {
    fn default() -> Self {
        Self {
            history_capacity: 1000,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl InspectorSettings {
    /// Apply command-line overrides on top of file values.
    #[must_use]
    pub fn with_overrides(mut self, capacity: Option<usize>, timeout_secs: Option<u64>) -> Self {
        if let Some(capacity) = capacity {
            self.history_capacity = capacity;
        }
        if let Some(secs) = timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        self.normalized()
    }

    /// Clamp to usable bounds: at least one history entry and a one second timeout.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.history_capacity = self.history_capacity.max(1);
        self.request_timeout = self.request_timeout.max(MIN_REQUEST_TIMEOUT);
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = InspectorSettings::default();
        assert_eq!(settings.history_capacity, 1000);
        assert_eq!(settings.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let settings: InspectorSettings =
            serde_json::from_str(r#"{"historyCapacity": 10}"#).unwrap();
        assert_eq!(settings.history_capacity, 10);
        assert_eq!(settings.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_cli_overrides() {
        let settings = InspectorSettings::default().with_overrides(Some(0), Some(3));
        assert_eq!(settings.history_capacity, 1);
        assert_eq!(settings.request_timeout, Duration::from_secs(3));

        let untouched = InspectorSettings::default().with_overrides(None, None);
        assert_eq!(untouched, InspectorSettings::default());
    }

    #[test]
    fn test_zero_timeout_is_raised_to_minimum() {
        let settings = InspectorSettings::default().with_overrides(None, Some(0));
        assert_eq!(settings.request_timeout, MIN_REQUEST_TIMEOUT);

        let from_file: InspectorSettings =
            serde_json::from_str(r#"{"historyCapacity": 0, "requestTimeoutSecs": 0}"#).unwrap();
        let normalized = from_file.normalized();
        assert_eq!(normalized.history_capacity, 1);
        assert_eq!(normalized.request_timeout, Duration::from_secs(1));
    }
}
