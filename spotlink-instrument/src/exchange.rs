use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Unique identifier for a supported spot-trading venue.
///
/// One variant per adapter in spec §4.2/§4.5's signing and parsing dialect tables. Unlike the
/// teacher's `ExchangeId`, this spec is spot-only (§1 non-goals), so there is exactly one
/// variant per venue rather than one per market type (no `BinanceFuturesUsd` alongside
/// `BinanceSpot`).
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeId {
    Binance,
    Bybit,
    Okx,
    Kraken,
    Bitfinex,
    Kucoin,
    Gateio,
    Lbank,
    Bitstamp,
    Bittrex,
    Bitforex,
    Pionex,
}

impl ExchangeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Binance => "binance",
            ExchangeId::Bybit => "bybit",
            ExchangeId::Okx => "okx",
            ExchangeId::Kraken => "kraken",
            ExchangeId::Bitfinex => "bitfinex",
            ExchangeId::Kucoin => "kucoin",
            ExchangeId::Gateio => "gateio",
            ExchangeId::Lbank => "lbank",
            ExchangeId::Bitstamp => "bitstamp",
            ExchangeId::Bittrex => "bittrex",
            ExchangeId::Bitforex => "bitforex",
            ExchangeId::Pionex => "pionex",
        }
    }

    pub const ALL: [ExchangeId; 12] = [
        ExchangeId::Binance,
        ExchangeId::Bybit,
        ExchangeId::Okx,
        ExchangeId::Kraken,
        ExchangeId::Bitfinex,
        ExchangeId::Kucoin,
        ExchangeId::Gateio,
        ExchangeId::Lbank,
        ExchangeId::Bitstamp,
        ExchangeId::Bittrex,
        ExchangeId::Bitforex,
        ExchangeId::Pionex,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_str_is_stable_for_every_venue() {
        for id in ExchangeId::ALL {
            assert!(id.as_str().chars().all(|c| c.is_ascii_lowercase()));
        }
    }
}
