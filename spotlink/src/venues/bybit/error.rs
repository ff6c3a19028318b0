//! Bybit envelope: `{"retCode": 10003, "retMsg": "..."}` everywhere, including over Http 200
//! (spec §4.5): a non-zero `retCode` in an otherwise-200 response is still classified as an error.

use crate::error::ExchangeError;
use reqwest::StatusCode;
use serde_json::Value;

/// Bybit always answers Http 200 and signals failure via a non-zero `retCode` inside the body, so
/// unlike Binance, a successful Http status alone doesn't mean success.
pub fn validate(status: StatusCode, body: Value) -> Result<Value, ExchangeError> {
    let code = body.get("retCode").and_then(Value::as_i64).unwrap_or(0);
    if status.is_success() && code == 0 {
        return Ok(body);
    }
    Err(build_error(status, &body, code))
}

fn build_error(status: StatusCode, body: &Value, code: i64) -> ExchangeError {
    let msg = body.get("retMsg").and_then(Value::as_str).unwrap_or("unknown Bybit error").to_string();

    match code {
        10003 | 10004 | 10005 => ExchangeError::AuthenticationError(msg),
        110001 => ExchangeError::OrderNotFound(msg),
        110007 | 110012 => ExchangeError::InsufficientFunds(msg),
        110025 => ExchangeError::BadSymbol(msg),
        10006 => ExchangeError::RateLimitExceeded(msg),
        110010 | 110011 | 110017 => ExchangeError::InvalidOrder(msg),
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
    fn nonzero_ret_code_over_http_200_is_an_error() {
        let error = validate(StatusCode::OK, json!({"retCode": 110001, "retMsg": "order not exists"})).unwrap_err();
        assert!(matches!(error, ExchangeError::OrderNotFound(_)));
    }

    #[test]
    fn zero_ret_code_passes_through() {
        let body = json!({"retCode": 0, "retMsg": "OK", "result": {}});
        assert_eq!(validate(StatusCode::OK, body.clone()).unwrap(), body);
    }
}
