use std::time::Duration;

use serde::Deserialize;

use crate::errors::{DeveloperError, PurchaseError};

pub const DEFAULT_EVENT_BUFFER_CAPACITY: usize = 200;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    /// What happens to native events raised before the connection is ready.
    pub event_buffer: EventBufferPolicy,
    /// Upper bound on the native `initConnection` call.
    pub init_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum EventBufferPolicy {
    /// Keep at most `capacity` events, discarding the oldest on overflow.
    DropOldest { capacity: usize },
    /// Never discard. Requires `initTimeoutMs`, so a connection that never
    /// becomes ready fails instead of accumulating events.
    Unbounded,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            event_buffer: EventBufferPolicy::default(),
            init_timeout_ms: None,
        }
    }
}

impl Default for EventBufferPolicy {
    fn default() -> Self {
        EventBufferPolicy::DropOldest {
            capacity: DEFAULT_EVENT_BUFFER_CAPACITY,
        }
    }
}

impl BridgeConfig {
    pub fn from_json(json: &str) -> Result<Self, PurchaseError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DeveloperError::with_debug("bridge config could not be parsed", &e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PurchaseError> {
        match self.event_buffer {
            EventBufferPolicy::DropOldest { capacity: 0 } => Err(DeveloperError::new(
                "event buffer capacity must be at least 1",
            )),
            EventBufferPolicy::Unbounded if self.init_timeout_ms.is_none() => Err(
                DeveloperError::new("an unbounded event buffer requires initTimeoutMs"),
            ),
            _ => Ok(()),
        }
    }

    pub fn init_timeout(&self) -> Option<Duration> {
        self.init_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::error_code::ErrorCode;

    #[test]
    fn empty_json_uses_defaults() {
        let config = BridgeConfig::from_json("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(
            config.event_buffer,
            EventBufferPolicy::DropOldest { capacity: 200 }
        );
    }

    #[test]
    fn parses_unbounded_with_timeout() {
        let config = BridgeConfig::from_json(
            r#"{ "eventBuffer": { "mode": "unbounded" }, "initTimeoutMs": 5000 }"#,
        )
        .unwrap();
        assert_eq!(config.event_buffer, EventBufferPolicy::Unbounded);
        assert_eq!(config.init_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn rejects_unbounded_without_timeout() {
        let e = BridgeConfig::from_json(r#"{ "eventBuffer": { "mode": "unbounded" } }"#)
            .unwrap_err();
        assert_eq!(e.code(), ErrorCode::DeveloperError);
    }

    #[test]
    fn rejects_zero_capacity() {
        let e = BridgeConfig::from_json(
            r#"{ "eventBuffer": { "mode": "drop-oldest", "capacity": 0 } }"#,
        )
        .unwrap_err();
        assert_eq!(e.code(), ErrorCode::DeveloperError);
    }

    #[test]
    fn rejects_malformed_json() {
        let e = BridgeConfig::from_json("{ nope").unwrap_err();
        assert_eq!(e.code(), ErrorCode::DeveloperError);
        assert!(e.debug_message().is_some());
    }
}
