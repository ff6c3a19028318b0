//! Bittrex streams over a SignalR-style invocation envelope rather than a flat
//! channel/topic frame: `{"H":"c3","M":"Subscribe","A":[[channelName, ...]],"I":invocationId}`
//! outbound, `{"M":[{"M":method,"A":[payload]}]}` inbound. None of the shared dispatcher's
//! channel/topic/stream/table keys apply, so the adapter registers a single global `"*"`
//! handler and demultiplexes by hand. Invocation ids increment monotonically per client; the
//! server's ack/nack protocol is under-specified, so the adapter does not wait on acks.

use spotlink_integration::protocol::ws::PingStrategy;
use std::sync::atomic::{AtomicU64, Ordering};

pub const WS_URL: &str = "wss://socket-v3.bittrex.com/signalr/connect";

pub fn ping_strategy() -> PingStrategy {
    PingStrategy::None
}

/// Monotone invocation-id source for the `"I"` field of each SignalR call.
pub struct InvocationIds(AtomicU64);

impl InvocationIds {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for InvocationIds {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_ids_increment_monotonically() {
        let ids = InvocationIds::new();
        assert_eq!(ids.next(), 0);
        assert_eq!(ids.next(), 1);
        assert_eq!(ids.next(), 2);
    }
}
