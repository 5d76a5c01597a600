//! Configuration for the handshake reconciler.

use std::time::Duration;

use serde::Deserialize;

/// Handshake reconciler configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HandshakeConfig {
    /// Relation endpoint name the controller serves.
    pub endpoint: String,
    /// Delay before a requeued transition is redelivered.
    #[serde(with = "serde_duration_secs")]
    pub requeue_delay: Duration,
    /// Event bus channel capacity.
    pub event_capacity: usize,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            endpoint: "compute".to_owned(),
            requeue_delay: Duration::from_secs(5),
            event_capacity: 64,
        }
    }
}

/// Serde helper for Duration as seconds.
mod serde_duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
