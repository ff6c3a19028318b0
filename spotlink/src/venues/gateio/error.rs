//! Gate.io returns bare payloads on success but flags logical failures with `{"label","message"}`
//! (spec §4.5), regardless of Http status - the classifier checks for that shape first.

use crate::error::ExchangeError;
use reqwest::StatusCode;
use serde_json::Value;

pub fn validate(status: StatusCode, body: Value) -> Result<Value, ExchangeError> {
    if let Some(label) = body.get("label").and_then(Value::as_str) {
        let msg = body.get("message").and_then(Value::as_str).unwrap_or("unknown Gate.io error").to_string();
        return Err(build_error(status, label, msg));
    }
    if status.is_success() {
        return Ok(body);
    }
    Err(build_error(status, "", "unknown Gate.io error".to_string()))
}

fn build_error(status: StatusCode, label: &str, msg: String) -> ExchangeError {
    match label {
        "INVALID_KEY" | "INVALID_SIGNATURE" | "INVALID_CREDENTIALS" => ExchangeError::AuthenticationError(msg),
        "INVALID_CURRENCY_PAIR" => ExchangeError::BadSymbol(msg),
        "BALANCE_NOT_ENOUGH" => ExchangeError::InsufficientFunds(msg),
        "ORDER_NOT_FOUND" => ExchangeError::OrderNotFound(msg),
        "INVALID_PARAM_VALUE" | "INVALID_PRECISION" | "TOO_FEW_PRECISION" | "ORDER_SIZE_TOO_SMALL" => ExchangeError::InvalidOrder(msg),
        "TOO_MANY_REQUESTS" => ExchangeError::RateLimitExceeded(msg),
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
    fn labeled_body_over_http_200_is_an_error() {
        let error = validate(StatusCode::OK, json!({"label": "BALANCE_NOT_ENOUGH", "message": "not enough"})).unwrap_err();
        assert!(matches!(error, ExchangeError::InsufficientFunds(_)));
    }

    #[test]
    fn unlabeled_body_passes_through() {
        let body = json!([{"currency_pair": "BTC_USDT"}]);
        assert_eq!(validate(StatusCode::OK, body.clone()).unwrap(), body);
    }
}
