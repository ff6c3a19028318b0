//! Bybit V5 public spot stream: one connection, JSON `{"op":"subscribe","args":[...]}` envelopes,
//! client-initiated JSON ping every 20s (spec §4.6).

use spotlink_integration::protocol::ws::PingStrategy;
use std::time::Duration;

pub const WS_URL: &str = "wss://stream.bybit.com/v5/public/spot";

pub fn trade_topic(venue_symbol: &str) -> String {
    format!("publicTrade.{venue_symbol}")
}

pub fn ping_strategy() -> PingStrategy {
    PingStrategy::JsonText {
        interval: Duration::from_secs(20),
        message: r#"{"op":"ping"}"#.to_string(),
    }
}
