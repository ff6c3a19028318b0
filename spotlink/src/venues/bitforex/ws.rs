//! Bitforex subscribes via a JSON array envelope — `[{"type":"subHq","event":"trade",
//! "param":{"businessType":symbol,"dType":0}}]` — and pings with bare string frames rather
//! than JSON (spec §4.6), which [`PingStrategy::JsonText`] already models: the strategy just
//! writes `message` as a text frame on an interval, JSON-valid or not.

use spotlink_integration::protocol::ws::PingStrategy;
use std::time::Duration;

pub const WS_URL: &str = "wss://www.bitforex.com/mkapi/coinGroup1/ws";

pub fn ping_strategy() -> PingStrategy {
    PingStrategy::JsonText { interval: Duration::from_secs(15), message: "ping_p".to_string() }
}
