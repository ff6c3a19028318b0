//! Bittrex returns a bare payload on success and a bare `{"code": "..."}` object on failure
//! (spec §4.5) - no envelope wrapper either way.

use crate::error::ExchangeError;
use reqwest::StatusCode;
use serde_json::Value;

pub fn validate(status: StatusCode, body: Value) -> Result<Value, ExchangeError> {
    if status.is_success() {
        return Ok(body);
    }

    let code = body.get("code").and_then(Value::as_str).unwrap_or("UNKNOWN_ERROR");
    let detail = body.get("detail").and_then(Value::as_str).unwrap_or(code).to_string();

    Err(match code {
        "INVALID_SIGNATURE" | "APIKEY_INVALID" | "INVALID_TIMESTAMP" => ExchangeError::AuthenticationError(detail),
        "INSUFFICIENT_FUNDS" => ExchangeError::InsufficientFunds(detail),
        "ORDER_NOT_OPEN" | "NOT_FOUND" => ExchangeError::OrderNotFound(detail),
        "MIN_TRADE_REQUIREMENT_NOT_MET" | "DUST_TRADE_DISALLOWED_MIN_VALUE" => ExchangeError::InvalidOrder(detail),
        "ACCOUNT_LOCKED" | "THROTTLED" if status == StatusCode::TOO_MANY_REQUESTS => ExchangeError::RateLimitExceeded(detail),
        _ if status == StatusCode::TOO_MANY_REQUESTS => ExchangeError::RateLimitExceeded(detail),
        _ if status.is_server_error() => ExchangeError::ExchangeNotAvailable(detail),
        _ => ExchangeError::BadRequest(detail),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_error_object_maps_by_code() {
        let error = validate(StatusCode::BAD_REQUEST, json!({"code": "INSUFFICIENT_FUNDS"})).unwrap_err();
        assert!(matches!(error, ExchangeError::InsufficientFunds(_)));
    }

    #[test]
    fn success_status_passes_body_through() {
        let body = json!({"symbol": "BTC-USD"});
        assert_eq!(validate(StatusCode::OK, body.clone()).unwrap(), body);
    }
}
