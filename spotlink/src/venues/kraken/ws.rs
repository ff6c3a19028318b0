//! Kraken WebSocket V2 public stream: `wss://ws.kraken.com/v2`, JSON
//! `{"method":"subscribe","params":{"channel":"trade","symbol":[...]}}` envelopes, native
//! `BASE/QUOTE` symbols (no venue translation, unlike the REST surface). Authenticated (private)
//! channels require a short-lived token from `GetWebSocketsToken` that this adapter does not yet
//! mint — `watch_orders` stays `NotSupported` for Kraken until that's wired up.
//!
//! All trade updates multiplex onto a single `"trade"` channel key regardless of symbol, so the
//! adapter keeps its own symbol -> sender map and fans out from one registered handler rather
//! than registering per symbol (see `Kraken::watch_trades`).

use spotlink_integration::protocol::ws::PingStrategy;
use std::time::Duration;

pub const WS_URL: &str = "wss://ws.kraken.com/v2";

pub fn ping_strategy() -> PingStrategy {
    PingStrategy::JsonText {
        interval: Duration::from_secs(30),
        message: r#"{"method":"ping"}"#.to_string(),
    }
}
