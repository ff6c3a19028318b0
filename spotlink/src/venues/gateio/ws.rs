use spotlink_integration::protocol::ws::PingStrategy;
use std::time::Duration;

pub const WS_URL: &str = "wss://api.gateio.ws/ws/v4/";

pub fn ping_strategy() -> PingStrategy {
    PingStrategy::NativeFrame { interval: Duration::from_secs(20) }
}

pub fn channel() -> &'static str {
    "spot.trades"
}
