use std::time::Duration;
use thiserror::Error;

/// Transport-level failures raised by the REST and WebSocket clients, before a venue adapter has
/// had a chance to classify them against its own error taxonomy
/// (`spotlink::error::ExchangeError`).
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("failed to parse Url: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("error building Http request: {0}")]
    HttpBuild(#[from] reqwest::Error),

    #[error("Http request timed out after {0:?}")]
    HttpTimeout(Duration),

    #[error("error deserialising response body: {error}, payload: {}", String::from_utf8_lossy(payload))]
    DeserialiseBinary {
        error: serde_json::Error,
        payload: Vec<u8>,
    },

    #[error("error serialising request body: {0}")]
    Serialise(#[from] serde_json::Error),

    #[error("error serialising query params: {0}")]
    SerialiseQuery(#[from] serde_urlencoded::ser::Error),

    #[error("WebSocket connection to {url} failed: {error}")]
    WebSocketConnect {
        url: String,
        error: tokio_tungstenite::tungstenite::Error,
    },

    #[error("WebSocket transport error: {0}")]
    WebSocketTransport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("attempted to send on a WebSocket that is not open")]
    WebSocketNotOpen,

    #[error("credentials required for a signed request but none were configured")]
    MissingCredentials,
}
