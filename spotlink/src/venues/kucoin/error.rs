//! KuCoin envelope: `{"code": "200000", "data": ...}` over Http 200; `code != "200000"` is a
//! logical failure regardless of status (spec §4.5).

use crate::error::ExchangeError;
use reqwest::StatusCode;
use serde_json::Value;

pub fn validate(status: StatusCode, body: Value) -> Result<Value, ExchangeError> {
    let code = body.get("code").and_then(Value::as_str).unwrap_or("0");
    if status.is_success() && code == "200000" {
        return Ok(body);
    }
    Err(build_error(status, &body, code))
}

fn build_error(status: StatusCode, body: &Value, code: &str) -> ExchangeError {
    let msg = body.get("msg").and_then(Value::as_str).unwrap_or("unknown KuCoin error").to_string();

    match code {
        "400003" | "400004" | "400005" | "411100" => ExchangeError::AuthenticationError(msg),
        "400100" => ExchangeError::BadRequest(msg),
        "400360" | "400370" => ExchangeError::InvalidOrder(msg),
        "200004" | "230003" => ExchangeError::InsufficientFunds(msg),
        "400100400" | "400200" => ExchangeError::BadSymbol(msg),
        "400100001" | "400350" => ExchangeError::OrderNotFound(msg),
        "429000" => ExchangeError::RateLimitExceeded(msg),
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
    fn nonstandard_code_over_http_200_is_an_error() {
        let error = validate(StatusCode::OK, json!({"code": "200004", "msg": "Balance insufficient"})).unwrap_err();
        assert!(matches!(error, ExchangeError::InsufficientFunds(_)));
    }

    #[test]
    fn standard_code_passes_through() {
        let body = json!({"code": "200000", "data": {}});
        assert_eq!(validate(StatusCode::OK, body.clone()).unwrap(), body);
    }
}
