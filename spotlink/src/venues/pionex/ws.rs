//! Pionex subscribes via `{"op":"SUBSCRIBE","topic":"TRADE","symbol":venue_symbol}` and does
//! not run a client-initiated ping at all - the server sends a bare `"PING"` text frame that
//! must be echoed back as `"PONG"` (spec §4.6). [`PingStrategy::ServerInitiated`] names that
//! contract; actually answering the server's ping is adapter work done in `watch_trades`'s
//! global handler, since the shared ping loop only runs client-initiated strategies.

use spotlink_integration::protocol::ws::PingStrategy;

pub const WS_URL: &str = "wss://ws.pionex.com/wsPub";

pub fn ping_strategy() -> PingStrategy {
    PingStrategy::ServerInitiated { pong_text: "PONG".to_string() }
}
