//! Pionex wraps every response in `{"result": bool, "code": "...", "message": "...", "data":
//! ...}` (spec §4.5).

use crate::error::ExchangeError;
use reqwest::StatusCode;
use serde_json::Value;

pub fn validate(status: StatusCode, body: Value) -> Result<Value, ExchangeError> {
    if body.get("result").and_then(Value::as_bool) == Some(true) {
        return Ok(body.get("data").cloned().unwrap_or(Value::Null));
    }

    let code = body.get("code").and_then(Value::as_str).unwrap_or("");
    let message = body.get("message").and_then(Value::as_str).unwrap_or("unknown Pionex error").to_string();

    Err(match code {
        "API_KEY_INVALID" | "SIGNATURE_INVALID" | "TIMESTAMP_INVALID" => ExchangeError::AuthenticationError(message),
        "BALANCE_NOT_ENOUGH" => ExchangeError::InsufficientFunds(message),
        "ORDER_NOT_EXIST" => ExchangeError::OrderNotFound(message),
        "ORDER_SIZE_TOO_SMALL" | "ORDER_PRICE_INVALID" => ExchangeError::InvalidOrder(message),
        _ if status == StatusCode::TOO_MANY_REQUESTS => ExchangeError::RateLimitExceeded(message),
        _ if status.is_server_error() => ExchangeError::ExchangeNotAvailable(message),
        _ => ExchangeError::BadRequest(message),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_unwraps_data() {
        let body = json!({"result": true, "data": {"symbols": []}});
        assert_eq!(validate(StatusCode::OK, body).unwrap(), json!({"symbols": []}));
    }

    #[test]
    fn failure_maps_by_code() {
        let body = json!({"result": false, "code": "BALANCE_NOT_ENOUGH", "message": "not enough"});
        let error = validate(StatusCode::OK, body).unwrap_err();
        assert!(matches!(error, ExchangeError::InsufficientFunds(_)));
    }
}
