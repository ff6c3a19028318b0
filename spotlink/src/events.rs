//! Adapter-level events (spec §4.6/§6): out-of-band signals a long-lived `Exchange` emits besides
//! the data returned from its `fetch_*`/`watch_*` methods.

use crate::error::ExchangeError;
use spotlink_integration::channel::{mpsc_unbounded, StreamRx, StreamTx};

#[derive(Debug, Clone)]
pub enum AdapterEvent {
    /// The throttler is within `headroom` tokens of exhaustion (spec §4.3).
    RateLimitWarning { available: u32, capacity: u32 },
    /// A WebSocket connection failed and is reconnecting.
    WsReconnecting { url: String, attempt: u32 },
    /// A non-fatal error surfaced outside the call that triggered it (e.g. a WS read-loop error).
    Error(String),
}

impl From<&ExchangeError> for AdapterEvent {
    fn from(error: &ExchangeError) -> Self {
        AdapterEvent::Error(error.to_string())
    }
}

pub fn events_channel() -> (StreamTx<AdapterEvent>, StreamRx<AdapterEvent>) {
    mpsc_unbounded()
}
