use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Strongly typed adapter configuration (spec §6), replacing the source's dynamically shaped
/// config object (spec §9 redesign flag) with a fixed record plus a per-venue extension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret: String,
    /// Required by OKX and KuCoin; ignored by every other venue.
    #[serde(default)]
    pub passphrase: Option<String>,
    /// Http timeout in ms; defaults to 10_000 (spec §6).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_true")]
    pub enable_rate_limit: bool,
    #[serde(default)]
    pub options: VenueOptions,
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

impl ExchangeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.secret.is_empty()
    }
}

/// Per-venue extension options (spec §6 config table): Bybit's `category`, OKX's
/// `instType`/`tdMode`, Gate.io's `settle`, plus the universal sandbox switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueOptions {
    #[serde(default)]
    pub sandbox: bool,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_inst_type")]
    pub inst_type: String,
    #[serde(default = "default_td_mode")]
    pub td_mode: String,
    #[serde(default = "default_settle")]
    pub settle: String,
}

impl Default for VenueOptions {
    fn default() -> Self {
        Self {
            sandbox: false,
            category: default_category(),
            inst_type: default_inst_type(),
            td_mode: default_td_mode(),
            settle: default_settle(),
        }
    }
}

fn default_category() -> String {
    "spot".to_string()
}

fn default_inst_type() -> String {
    "SPOT".to_string()
}

fn default_td_mode() -> String {
    "cash".to_string()
}

fn default_settle() -> String {
    "usdt".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_ten_seconds() {
        let config = ExchangeConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(10_000));
    }

    #[test]
    fn missing_credentials_detected() {
        let config = ExchangeConfig::default();
        assert!(!config.has_credentials());
    }
}
