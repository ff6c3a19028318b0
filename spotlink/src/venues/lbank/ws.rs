//! LBank V3 streaming (spec §4.6): ping is a UUID echo sent as a JSON application-level message
//! rather than a native WS frame.

use spotlink_integration::protocol::ws::PingStrategy;
use std::time::Duration;

pub const WS_URL: &str = "wss://www.lbkex.net/ws/V2/";

pub fn ping_strategy() -> PingStrategy {
    PingStrategy::JsonText { interval: Duration::from_secs(20), message: r#"{"action":"ping","ping":"spotlink"}"#.to_string() }
}
