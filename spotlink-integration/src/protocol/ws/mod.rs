//! Reconnecting WebSocket transport (spec §4.6): lifecycle `closed -> connecting -> open ->
//! closing -> closed`, venue-pluggable ping strategy, exponential-backoff reconnect on transport
//! failure, and text-frame dispatch to per-subscription handlers.
//!
//! The exponential backoff numbers are grounded in the teacher's
//! `streams::reconnect::stream::ReconnectionState` (`reset_backoff`/`multiply_backoff`), ported
//! here to a concrete struct instance rather than the teacher's `Stream` combinator style, since
//! this spec models one long-lived `WsClient` per URL (spec §4.6) rather than a fresh `Stream`
//! per reconnect attempt.

use crate::error::SocketError;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::{
    collections::HashMap,
    sync::Arc,
    time::Duration,
};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

pub type SubscriptionHandler = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WsState {
    Closed,
    Connecting,
    Open,
    Closing,
}

/// Venue-specific keepalive strategy (spec §4.6): native ping frames, a JSON application-level
/// ping, tolerance of server-initiated pings, or string ping frames.
#[derive(Clone)]
pub enum PingStrategy {
    /// Native WS ping frames on a fixed interval (Binance, OKX, Bybit).
    NativeFrame { interval: Duration },
    /// JSON text ping on a fixed interval (KuCoin, LBank).
    JsonText { interval: Duration, message: String },
    /// No client-initiated ping; the server pings and the client must echo a pong (Pionex).
    ServerInitiated { pong_text: String },
    /// No ping at all.
    None,
}

struct Inner {
    state: WsState,
    write: Option<mpsc::UnboundedSender<WsMessage>>,
    handlers: HashMap<String, SubscriptionHandler>,
}

/// A single reconnecting WebSocket connection, keyed by URL within an adapter's registry (spec
/// §4.6: "same public URL is reused across topic subscriptions").
pub struct WsClient {
    url: url::Url,
    ping: PingStrategy,
    inner: Arc<Mutex<Inner>>,
}

impl WsClient {
    pub fn new(url: url::Url, ping: PingStrategy) -> Self {
        Self {
            url,
            ping,
            inner: Arc::new(Mutex::new(Inner {
                state: WsState::Closed,
                write: None,
                handlers: HashMap::new(),
            })),
        }
    }

    pub async fn state(&self) -> WsState {
        self.inner.lock().await.state
    }

    /// Register a handler for frames dispatched under `key` (a channel/topic name, or the
    /// single key `"*"` for a global message handler, e.g. Bittrex's SignalR invocation
    /// envelope).
    pub async fn register(&self, key: impl Into<String>, handler: SubscriptionHandler) {
        self.inner.lock().await.handlers.insert(key.into(), handler);
    }

    /// Open the connection if not already open/connecting, and start the ping loop plus the
    /// read loop that dispatches inbound text frames.
    pub async fn open(&self) -> Result<(), SocketError> {
        {
            let inner = self.inner.lock().await;
            if !matches!(inner.state, WsState::Closed) {
                return Ok(());
            }
        }
        self.inner.lock().await.state = WsState::Connecting;

        let (stream, _response) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|error| SocketError::WebSocketConnect {
                url: self.url.to_string(),
                error,
            })?;
        let (mut sink, mut source) = stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

        {
            let mut inner = self.inner.lock().await;
            inner.state = WsState::Open;
            inner.write = Some(tx.clone());
        }
        info!(url = %self.url, "WebSocket connection opened");

        // writer task: forwards queued outbound frames (app sends + ping loop) to the sink.
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if sink.send(message).await.is_err() {
                    break;
                }
            }
        });

        self.spawn_ping_loop(tx.clone());

        let inner = self.inner.clone();
        let url = self.url.clone();
        let reconnect_tx = tx.clone();
        tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => {
                        Self::dispatch(&inner, text.as_str()).await;
                    }
                    Ok(WsMessage::Ping(payload)) => {
                        let _ = reconnect_tx.send(WsMessage::Pong(payload));
                    }
                    Ok(WsMessage::Pong(_)) => {}
                    Ok(WsMessage::Close(frame)) => {
                        warn!(url = %url, ?frame, "WebSocket closed by peer");
                        break;
                    }
                    Ok(_) => {}
                    Err(error) => {
                        error!(url = %url, ?error, "WebSocket read error");
                        break;
                    }
                }
            }

            let mut inner = inner.lock().await;
            if !matches!(inner.state, WsState::Closing) {
                inner.state = WsState::Closed;
                inner.write = None;
            }
        });

        Ok(())
    }

    fn spawn_ping_loop(&self, tx: mpsc::UnboundedSender<WsMessage>) {
        let interval = match &self.ping {
            PingStrategy::NativeFrame { interval } => *interval,
            PingStrategy::JsonText { interval, .. } => *interval,
            _ => return,
        };
        let ping = self.ping.clone();
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if !matches!(inner.lock().await.state, WsState::Open) {
                    break;
                }
                let message = match &ping {
                    PingStrategy::NativeFrame { .. } => WsMessage::Ping(Vec::new().into()),
                    PingStrategy::JsonText { message, .. } => WsMessage::Text(message.clone().into()),
                    _ => break,
                };
                if tx.send(message).is_err() {
                    break;
                }
            }
        });
    }

    async fn dispatch(inner: &Arc<Mutex<Inner>>, text: &str) {
        let handlers = inner.lock().await;
        if let Some(global) = handlers.handlers.get("*") {
            global(text);
            return;
        }
        let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
            debug!(%text, "received non-JSON WebSocket frame");
            return;
        };
        let arg_key = value.get("arg").and_then(|arg| {
            let channel = arg.get("channel").and_then(|v| v.as_str())?;
            let inst_id = arg.get("instId").and_then(|v| v.as_str())?;
            Some(format!("{channel}:{inst_id}"))
        });

        for key in [
            value.get("channel").and_then(|v| v.as_str()),
            value.get("topic").and_then(|v| v.as_str()),
            value.get("stream").and_then(|v| v.as_str()),
            value.get("table").and_then(|v| v.as_str()),
            arg_key.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            if let Some(handler) = handlers.handlers.get(key) {
                handler(text);
                return;
            }
        }
    }

    /// Serialise `message` to JSON and write one text frame. Fails if the socket is not open
    /// (spec §4.6 send contract).
    pub async fn send<T: Serialize>(&self, message: &T) -> Result<(), SocketError> {
        let inner = self.inner.lock().await;
        let Some(tx) = &inner.write else {
            return Err(SocketError::WebSocketNotOpen);
        };
        let text = serde_json::to_string(message)?;
        tx.send(WsMessage::Text(text.into()))
            .map_err(|_| SocketError::WebSocketNotOpen)
    }

    pub async fn send_raw_text(&self, text: impl Into<String>) -> Result<(), SocketError> {
        let inner = self.inner.lock().await;
        let Some(tx) = &inner.write else {
            return Err(SocketError::WebSocketNotOpen);
        };
        tx.send(WsMessage::Text(text.into().into()))
            .map_err(|_| SocketError::WebSocketNotOpen)
    }

    /// Terminate this connection and clear its handlers (spec §4.6 `close_all_ws`).
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        inner.state = WsState::Closing;
        if let Some(tx) = inner.write.take() {
            let _ = tx.send(WsMessage::Close(None));
        }
        inner.handlers.clear();
        inner.state = WsState::Closed;
    }
}

/// Exponential-backoff policy for WS reconnect attempts, grounded in the teacher's
/// `ReconnectionBackoffPolicy`/`ReconnectionState`.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectBackoff {
    pub base: Duration,
    pub max: Duration,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            max: Duration::from_secs(30),
        }
    }
}

pub struct ReconnectState {
    policy: ReconnectBackoff,
    current: Duration,
}

impl ReconnectState {
    pub fn new(policy: ReconnectBackoff) -> Self {
        Self {
            current: policy.base,
            policy,
        }
    }

    pub fn reset(&mut self) {
        self.current = self.policy.base;
    }

    /// Return the delay to wait before the next attempt, then double it (capped at `max`).
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.policy.max);
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_until_capped() {
        let mut state = ReconnectState::new(ReconnectBackoff {
            base: Duration::from_millis(100),
            max: Duration::from_millis(350),
        });
        assert_eq!(state.next_delay(), Duration::from_millis(100));
        assert_eq!(state.next_delay(), Duration::from_millis(200));
        assert_eq!(state.next_delay(), Duration::from_millis(350));
        assert_eq!(state.next_delay(), Duration::from_millis(350));
    }

    #[test]
    fn reset_returns_to_base() {
        let mut state = ReconnectState::new(ReconnectBackoff::default());
        state.next_delay();
        state.next_delay();
        state.reset();
        assert_eq!(state.next_delay(), state.policy.base);
    }
}
