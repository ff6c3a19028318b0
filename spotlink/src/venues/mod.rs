//! One module per supported venue (spec §4.2/§4.5 per-venue dialect tables). Each venue module
//! exposes a `mod.rs` wiring the adapter together, plus `sign.rs`, `symbols.rs`, `parse.rs`,
//! `ws.rs` and `error.rs` for its own signing, symbol translation, response parsing, streaming
//! dialect and error-code mapping.

pub mod binance;
pub mod bitfinex;
pub mod bitforex;
pub mod bitstamp;
pub mod bittrex;
pub mod bybit;
pub mod gateio;
pub mod kraken;
pub mod kucoin;
pub mod lbank;
pub mod okx;
pub mod pionex;
