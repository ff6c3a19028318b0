use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct AssetBalance {
    pub free: f64,
    pub used: f64,
}

impl AssetBalance {
    pub fn total(&self) -> f64 {
        self.free + self.used
    }
}

/// Mapping from canonicalised asset code to balance (spec §3 `Balance`).
///
/// Entries whose `total()` is zero are omitted by [`Balances::insert_nonzero`] (except where a
/// venue explicitly enumerates every asset it supports, which callers handle by inserting
/// directly into `by_asset`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Balances {
    pub timestamp: i64,
    pub by_asset: BTreeMap<String, AssetBalance>,
}

impl Balances {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            by_asset: BTreeMap::new(),
        }
    }

    pub fn insert_nonzero(&mut self, asset: impl Into<String>, balance: AssetBalance) {
        if balance.total() != 0.0 {
            self.by_asset.insert(asset.into(), balance);
        }
    }
}

/// Canonicalise a venue-native asset code to the unified code (spec §4.4, §8 scenario 4):
/// Kraken's `ZUSD -> USD`, `XXBT -> BTC`, `XETH -> ETH`; Bitfinex's `UST -> USDT`.
pub fn canonicalize_asset(code: &str) -> String {
    match code {
        "XXBT" | "XBT" => "BTC".to_string(),
        "ZUSD" => "USD".to_string(),
        "ZEUR" => "EUR".to_string(),
        "XETH" => "ETH".to_string(),
        "UST" => "USDT".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kraken_aliases_canonicalize() {
        assert_eq!(canonicalize_asset("XXBT"), "BTC");
        assert_eq!(canonicalize_asset("ZUSD"), "USD");
        assert_eq!(canonicalize_asset("XETH"), "ETH");
    }

    #[test]
    fn zero_balance_is_excluded() {
        let mut balances = Balances::new(0);
        balances.insert_nonzero("BTC", AssetBalance { free: 0.0, used: 0.0 });
        assert!(!balances.by_asset.contains_key("BTC"));
    }

    #[test]
    fn nonzero_balance_total_is_free_plus_used() {
        let balance = AssetBalance { free: 1.0, used: 0.5 };
        assert_eq!(balance.total(), 1.5);
    }
}
