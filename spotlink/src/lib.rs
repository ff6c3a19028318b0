//! Spotlink: a unified async client over a dozen cryptocurrency spot exchanges (spec §1-§2).
//!
//! [`Exchange`] is the single façade every venue adapter under [`venues`] implements; callers
//! program against it and never need to special-case a venue's signing dialect, symbol format or
//! WebSocket subscription shape.

pub mod capability;
pub mod config;
pub mod error;
pub mod events;
pub mod exchange;
pub mod market_cache;
pub mod request;
pub mod venues;
pub mod ws_registry;

pub use capability::Capabilities;
pub use config::ExchangeConfig;
pub use error::ExchangeError;
pub use exchange::{Exchange, NewOrder};

use spotlink_instrument::exchange::ExchangeId;
use std::sync::Arc;

/// Construct the adapter for `id` from `config` (spec §5 "one entry point per venue").
pub fn build(id: ExchangeId, config: ExchangeConfig) -> Arc<dyn Exchange> {
    match id {
        ExchangeId::Binance => Arc::new(venues::binance::Binance::new(config)),
        ExchangeId::Bybit => Arc::new(venues::bybit::Bybit::new(config)),
        ExchangeId::Okx => Arc::new(venues::okx::Okx::new(config)),
        ExchangeId::Kraken => Arc::new(venues::kraken::Kraken::new(config)),
        ExchangeId::Bitfinex => Arc::new(venues::bitfinex::Bitfinex::new(config)),
        ExchangeId::Kucoin => Arc::new(venues::kucoin::Kucoin::new(config)),
        ExchangeId::Gateio => Arc::new(venues::gateio::Gateio::new(config)),
        ExchangeId::Lbank => Arc::new(venues::lbank::Lbank::new(config)),
        ExchangeId::Bitstamp => Arc::new(venues::bitstamp::Bitstamp::new(config)),
        ExchangeId::Bittrex => Arc::new(venues::bittrex::Bittrex::new(config)),
        ExchangeId::Bitforex => Arc::new(venues::bitforex::Bitforex::new(config)),
        ExchangeId::Pionex => Arc::new(venues::pionex::Pionex::new(config)),
    }
}
