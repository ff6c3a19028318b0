//! KuCoin streaming (spec §4.6) needs a short-lived token and server-chosen endpoint fetched over
//! REST (`POST /api/v1/bullet-public`) before a socket can be opened at all - unlike every other
//! venue's static public WS URL. `Kucoin::watch_trades` performs that REST round trip and appends
//! the token as a query parameter to the endpoint this module's [`WS_URL`] fallback only covers
//! if the bullet call fails. Ping is an application-level JSON ping on an interval, not a native
//! WS frame.

use spotlink_integration::protocol::ws::PingStrategy;
use std::time::Duration;

/// Used only if the dynamic bullet-token endpoint can't be reached; KuCoin's public default.
pub const WS_URL: &str = "wss://ws-api-spot.kucoin.com/";

pub fn ping_strategy() -> PingStrategy {
    PingStrategy::JsonText { interval: Duration::from_secs(18), message: r#"{"type":"ping"}"#.to_string() }
}

pub fn trade_topic(venue_symbol: &str) -> String {
    format!("/market/match:{venue_symbol}")
}
