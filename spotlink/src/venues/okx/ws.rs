//! OKX V5 public stream: one connection, `{"op":"subscribe","args":[{"channel":...,"instId":...}]}`
//! envelopes, native WS ping frames every 25s (spec §4.6).

use spotlink_integration::protocol::ws::PingStrategy;
use std::time::Duration;

pub const WS_URL: &str = "wss://ws.okx.com:8443/ws/v5/public";

pub fn trade_arg(venue_symbol: &str) -> serde_json::Value {
    serde_json::json!({ "channel": "trades", "instId": venue_symbol })
}

pub fn channel_key(venue_symbol: &str) -> String {
    format!("trades:{venue_symbol}")
}

pub fn ping_strategy() -> PingStrategy {
    PingStrategy::NativeFrame { interval: Duration::from_secs(25) }
}
