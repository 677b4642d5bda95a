use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the tag orchestrator.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// How long a single discovery window stays open for a tag to appear.
    pub discover_timeout: Duration,
    /// Upper bound on one read or write once a tag has been discovered.
    pub transaction_timeout: Duration,
    /// Seed for deterministic simulated identifiers.
    pub simulation_seed: String,
    /// Language code stamped into NDEF Text records.
    pub language: String,
    /// Fall back to simulated tags when the platform has no capability.
    /// When false, operations fail with `CapabilityUnavailable` instead.
    pub allow_simulation: bool,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            discover_timeout: Duration::from_secs(30),
            transaction_timeout: Duration::from_secs(5),
            simulation_seed: "prov-sim".into(),
            language: "en".into(),
            allow_simulation: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_thirty_seconds() {
        let config = TagConfig::default();
        assert_eq!(config.discover_timeout, Duration::from_secs(30));
        assert_eq!(config.transaction_timeout, Duration::from_secs(5));
        assert_eq!(config.language, "en");
        assert!(config.allow_simulation);
    }
}
