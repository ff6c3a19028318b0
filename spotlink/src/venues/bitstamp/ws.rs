//! Bitstamp's WS gateway speaks a `bts:subscribe` envelope; trade frames carry the
//! subscribed channel name directly at the top level (`"channel": "live_trades_{pair}"`),
//! which the shared dispatcher already keys handlers on, so one handler per channel suffices
//! with no adapter-local fan-out table.

use spotlink_integration::protocol::ws::PingStrategy;
use std::time::Duration;

pub const WS_URL: &str = "wss://ws.bitstamp.net";

pub fn ping_strategy() -> PingStrategy {
    PingStrategy::NativeFrame { interval: Duration::from_secs(20) }
}

pub fn trade_channel(venue_symbol: &str) -> String {
    format!("live_trades_{venue_symbol}")
}
