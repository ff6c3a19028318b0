//! Per-adapter registry of [`WsClient`]s keyed by URL (spec §4.6): subscribing to two channels
//! on the same public stream reuses one connection rather than opening a socket per topic.

use spotlink_integration::protocol::ws::{PingStrategy, WsClient};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct WsRegistry {
    clients: Mutex<HashMap<String, Arc<WsClient>>>,
}

impl WsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the existing client for `url`, or open a new one with `ping` if none exists yet.
    pub async fn get_or_connect(
        &self,
        url: &url::Url,
        ping: PingStrategy,
    ) -> Result<Arc<WsClient>, spotlink_integration::error::SocketError> {
        let key = url.to_string();
        let mut clients = self.clients.lock().await;
        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }
        let client = Arc::new(WsClient::new(url.clone(), ping));
        client.open().await?;
        clients.insert(key, client.clone());
        Ok(client)
    }

    /// Close every tracked connection (spec §4.6 `close_all_ws`).
    pub async fn close_all(&self) {
        let mut clients = self.clients.lock().await;
        for (_, client) in clients.drain() {
            client.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_starts_empty() {
        let registry = WsRegistry::new();
        assert!(registry.clients.try_lock().unwrap().is_empty());
    }
}
