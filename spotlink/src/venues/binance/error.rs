//! Binance error envelope: `{"code": -2010, "msg": "..."}`, signalled purely via Http status
//! (spec §4.5 error mapping table) - a 2xx body is always the success shape.

use crate::error::ExchangeError;
use reqwest::StatusCode;
use serde_json::Value;

pub fn validate(status: StatusCode, body: Value) -> Result<Value, ExchangeError> {
    if status.is_success() {
        return Ok(body);
    }
    Err(build_error(status, &body))
}

fn build_error(status: StatusCode, body: &Value) -> ExchangeError {
    let code = body.get("code").and_then(Value::as_i64).unwrap_or(0);
    let msg = body
        .get("msg")
        .and_then(Value::as_str)
        .unwrap_or("unknown Binance error")
        .to_string();

    match code {
        -1022 | -2014 | -2015 => ExchangeError::AuthenticationError(msg),
        -2013 => ExchangeError::OrderNotFound(msg),
        -2010 if msg.contains("insufficient") => ExchangeError::InsufficientFunds(msg),
        -1121 => ExchangeError::BadSymbol(msg),
        -1100 | -1102 | -1106 | -2010 => ExchangeError::InvalidOrder(msg),
        -1003 => ExchangeError::RateLimitExceeded(msg),
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
    fn unknown_order_maps_to_order_not_found() {
        let error = validate(StatusCode::BAD_REQUEST, json!({"code": -2013, "msg": "Order does not exist."})).unwrap_err();
        assert!(matches!(error, ExchangeError::OrderNotFound(_)));
    }

    #[test]
    fn rate_limit_status_maps_even_without_a_known_code() {
        let error = validate(StatusCode::TOO_MANY_REQUESTS, json!({"code": -9999, "msg": "slow down"})).unwrap_err();
        assert!(matches!(error, ExchangeError::RateLimitExceeded(_)));
    }

    #[test]
    fn success_status_passes_body_through() {
        let body = json!({"symbol": "BTCUSDT"});
        assert_eq!(validate(StatusCode::OK, body.clone()).unwrap(), body);
    }
}
