//! Bitfinex V2 public stream: frames are raw Json arrays keyed by a numeric `chanId` assigned at
//! subscribe time (`[chanId, "te"|"tu", [...]]`), never an object with a channel name - the
//! shared dispatcher can't route these by key, so the adapter registers a single `"*"` handler
//! and tracks its own `chanId -> symbol` table (see `Bitfinex::watch_trades`). Native WS ping
//! frames every 15s.

use spotlink_integration::protocol::ws::PingStrategy;
use std::time::Duration;

pub const WS_URL: &str = "wss://api-pub.bitfinex.com/ws/2";

pub fn ping_strategy() -> PingStrategy {
    PingStrategy::NativeFrame { interval: Duration::from_secs(15) }
}
