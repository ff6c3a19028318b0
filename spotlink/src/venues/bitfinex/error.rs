//! Bitfinex V2 error envelope: a plain `["error", <code>, "<message>"]` array in place of the
//! normal response shape, over Http 200 (spec §4.5) - so the classifier must inspect the body's
//! shape, not just its status.

use crate::error::ExchangeError;
use reqwest::StatusCode;
use serde_json::Value;

pub fn validate(status: StatusCode, body: Value) -> Result<Value, ExchangeError> {
    if let Some(array) = body.as_array() {
        if array.first().and_then(Value::as_str) == Some("error") {
            let code = array.get(1).and_then(Value::as_i64).unwrap_or(0);
            let msg = array.get(2).and_then(Value::as_str).unwrap_or("unknown Bitfinex error").to_string();
            return Err(build_error(status, code, msg));
        }
    }
    if status.is_success() {
        return Ok(body);
    }
    Err(build_error(status, 0, "unknown Bitfinex error".to_string()))
}

fn build_error(status: StatusCode, code: i64, msg: String) -> ExchangeError {
    match code {
        10020 => ExchangeError::BadRequest(msg),
        10100 | 10114 => ExchangeError::AuthenticationError(msg),
        10001 => ExchangeError::InvalidOrder(msg),
        _ if msg.to_lowercase().contains("not enough") || msg.to_lowercase().contains("insufficient") => {
            ExchangeError::InsufficientFunds(msg)
        }
        _ if msg.to_lowercase().contains("invalid order: not found") => ExchangeError::OrderNotFound(msg),
        _ if status == StatusCode::TOO_MANY_REQUESTS => ExchangeError::RateLimitExceeded(msg),
        _ if status.is_server_error() => ExchangeError::ExchangeNotAvailable(msg),
        _ => ExchangeError::BadRequest(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_shaped_array_over_http_200_is_an_error() {
        let error = validate(StatusCode::OK, json!(["error", 10100, "apikey: invalid"])).unwrap_err();
        assert!(matches!(error, ExchangeError::AuthenticationError(_)));
    }

    #[test]
    fn ordinary_array_body_passes_through() {
        let body = json!([[1, 2, 3]]);
        assert_eq!(validate(StatusCode::OK, body.clone()).unwrap(), body);
    }
}
