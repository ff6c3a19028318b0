//! Unified error taxonomy every venue adapter classifies its failures into (spec §7), sitting one
//! layer above the transport-level [`spotlink_integration::error::SocketError`].

use spotlink_integration::error::SocketError;
use std::time::Duration;
use thiserror::Error;

/// The error a caller of any `Exchange` method observes.
///
/// Venue-specific status codes and error strings are mapped down to this fixed set by each
/// adapter's `error.rs` (spec §4.5/§7); callers that only care about the taxonomy never need to
/// match on a venue's own vocabulary.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("authentication failed: {0}")]
    AuthenticationError(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("account not enabled for this operation: {0}")]
    AccountNotEnabled(String),

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("unknown symbol: {0}")]
    BadSymbol(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("exchange unavailable: {0}")]
    ExchangeNotAvailable(String),

    #[error("network error: {0}")]
    NetworkError(#[from] SocketError),

    #[error("request timed out after {0:?}")]
    RequestTimeout(Duration),

    #[error("{0} does not support this operation")]
    NotSupported(&'static str),
}

impl ExchangeError {
    /// `true` for the subset of errors a caller can reasonably retry without changing the
    /// request (spec §7 substitutability: `NetworkError`/`RequestTimeout`/`ExchangeNotAvailable`
    /// are transient, everything else is not).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExchangeError::NetworkError(_)
                | ExchangeError::RequestTimeout(_)
                | ExchangeError::ExchangeNotAvailable(_)
                | ExchangeError::RateLimitExceeded(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_are_retryable() {
        let error = ExchangeError::NetworkError(SocketError::WebSocketNotOpen);
        assert!(error.is_retryable());
    }

    #[test]
    fn invalid_order_is_not_retryable() {
        let error = ExchangeError::InvalidOrder("amount below minimum".into());
        assert!(!error.is_retryable());
    }
}
