//! Bitforex wraps every response (success or failure) in `{"success": bool, "code": "...",
//! "data": ..., "message": "..."}` over HTTP 200 (spec §4.5).

use crate::error::ExchangeError;
use reqwest::StatusCode;
use serde_json::Value;

pub fn validate(status: StatusCode, body: Value) -> Result<Value, ExchangeError> {
    if body.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(body.get("data").cloned().unwrap_or(Value::Null));
    }

    let code = body.get("code").and_then(Value::as_str).unwrap_or("");
    let message = body.get("message").and_then(Value::as_str).unwrap_or("unknown Bitforex error").to_string();

    Err(match code {
        "1014" | "1015" | "1016" => ExchangeError::AuthenticationError(message),
        "1012" => ExchangeError::InsufficientFunds(message),
        "1013" => ExchangeError::OrderNotFound(message),
        "1006" | "1007" => ExchangeError::InvalidOrder(message),
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
        let body = json!({"success": true, "code": "0", "data": {"last": "30000"}});
        assert_eq!(validate(StatusCode::OK, body).unwrap(), json!({"last": "30000"}));
    }

    #[test]
    fn failure_maps_by_code() {
        let body = json!({"success": false, "code": "1012", "message": "insufficient balance"});
        let error = validate(StatusCode::OK, body).unwrap_err();
        assert!(matches!(error, ExchangeError::InsufficientFunds(_)));
    }
}
