//! LBank wraps every payload in `{"result": true|"true", "error_code": N, "data": ...}` (spec
//! §4.5); `result` false (as either a JSON bool or the legacy string form) marks a logical
//! failure regardless of Http status.

use crate::error::ExchangeError;
use reqwest::StatusCode;
use serde_json::Value;

fn result_is_true(body: &Value) -> bool {
    match body.get("result") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

pub fn validate(status: StatusCode, body: Value) -> Result<Value, ExchangeError> {
    if status.is_success() && result_is_true(&body) {
        return Ok(body);
    }
    Err(build_error(status, &body))
}

fn build_error(status: StatusCode, body: &Value) -> ExchangeError {
    let code = body.get("error_code").and_then(Value::as_i64).unwrap_or(0);
    let msg = format!("LBank error_code {code}");

    match code {
        10001 | 10002 | 10003 | 10004 => ExchangeError::AuthenticationError(msg),
        10007 | 10008 => ExchangeError::BadSymbol(msg),
        13003 | 13004 => ExchangeError::InsufficientFunds(msg),
        10013 | 10014 => ExchangeError::InvalidOrder(msg),
        10020 => ExchangeError::OrderNotFound(msg),
        10010 => ExchangeError::RateLimitExceeded(msg),
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
    fn insufficient_balance_code_is_mapped() {
        let error = validate(StatusCode::OK, json!({"result": false, "error_code": 13003})).unwrap_err();
        assert!(matches!(error, ExchangeError::InsufficientFunds(_)));
    }

    #[test]
    fn true_result_passes_through() {
        let body = json!({"result": true, "data": []});
        assert_eq!(validate(StatusCode::OK, body.clone()).unwrap(), body);
    }
}
