//! Bitstamp returns bare payloads on success, `{"status":"error","reason":...,"code":"..."}` on
//! failure - often still over Http 200 (spec §4.5), so the body's shape is checked first.

use crate::error::ExchangeError;
use reqwest::StatusCode;
use serde_json::Value;

pub fn validate(status: StatusCode, body: Value) -> Result<Value, ExchangeError> {
    if body.get("status").and_then(Value::as_str) == Some("error") {
        return Err(build_error(status, &body));
    }
    if status.is_success() {
        return Ok(body);
    }
    Err(build_error(status, &body))
}

fn build_error(status: StatusCode, body: &Value) -> ExchangeError {
    let code = body.get("code").and_then(Value::as_str).unwrap_or("");
    let reason = match body.get("reason") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "unknown Bitstamp error".to_string(),
    };

    match code {
        "API0001" | "API0002" | "API0003" => ExchangeError::AuthenticationError(reason),
        "API0006" => ExchangeError::InsufficientFunds(reason),
        "API0017" | "API0018" => ExchangeError::OrderNotFound(reason),
        "API0020" | "API0021" => ExchangeError::InvalidOrder(reason),
        _ if reason.to_lowercase().contains("not enough") => ExchangeError::InsufficientFunds(reason),
        _ if status == StatusCode::TOO_MANY_REQUESTS => ExchangeError::RateLimitExceeded(reason),
        _ if status.is_server_error() => ExchangeError::ExchangeNotAvailable(reason),
        _ => ExchangeError::BadRequest(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_status_over_http_200_is_an_error() {
        let error = validate(StatusCode::OK, json!({"status": "error", "reason": "Invalid API key", "code": "API0001"})).unwrap_err();
        assert!(matches!(error, ExchangeError::AuthenticationError(_)));
    }

    #[test]
    fn bare_body_passes_through() {
        let body = json!({"high": "30000.0"});
        assert_eq!(validate(StatusCode::OK, body.clone()).unwrap(), body);
    }
}
