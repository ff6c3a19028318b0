//! Binance streams over the combined-stream endpoint: one connection, topics selected via the
//! `streams=` query param, native WS ping frames every 3 minutes (spec §4.6).

use spotlink_integration::protocol::ws::PingStrategy;
use std::time::Duration;
use url::Url;

pub const BASE_WS_URL: &str = "wss://stream.binance.com:9443/stream";

pub fn trade_channel(venue_symbol: &str) -> String {
    format!("{}@trade", venue_symbol.to_lowercase())
}

pub fn ticker_channel(venue_symbol: &str) -> String {
    format!("{}@ticker", venue_symbol.to_lowercase())
}

pub fn order_book_channel(venue_symbol: &str) -> String {
    format!("{}@depth20@100ms", venue_symbol.to_lowercase())
}

pub fn combined_stream_url(channels: &[String]) -> Url {
    let joined = channels.join("/");
    Url::parse(&format!("{BASE_WS_URL}?streams={joined}")).expect("combined stream url is always valid")
}

pub fn ping_strategy() -> PingStrategy {
    PingStrategy::NativeFrame {
        interval: Duration::from_secs(180),
    }
}
