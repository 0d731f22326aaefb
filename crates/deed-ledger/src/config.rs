use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Ledger engine settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Backoff applied to chain conflicts and transient store failures.
    pub retry: RetryPolicy,
    /// Budget used when a caller does not supply its own deadline.
    pub default_timeout_ms: u64,
}

impl LedgerConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms.max(1))
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            default_timeout_ms: 5_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_default() {
        let config: LedgerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.default_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn zero_timeout_is_floored() {
        let config = LedgerConfig {
            default_timeout_ms: 0,
            ..LedgerConfig::default()
        };
        assert_eq!(config.default_timeout(), Duration::from_millis(1));
    }
}
