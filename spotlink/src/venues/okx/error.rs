//! OKX envelope: `{"code": "51400", "msg": "...", "data": [...]}` over Http 200 at the top level;
//! some bulk endpoints additionally carry a per-item `sCode`/`sMsg` inside `data` which callers
//! inspect themselves (spec §4.5) — this only classifies the outer envelope.

use crate::error::ExchangeError;
use reqwest::StatusCode;
use serde_json::Value;

pub fn validate(status: StatusCode, body: Value) -> Result<Value, ExchangeError> {
    let code = body.get("code").and_then(Value::as_str).unwrap_or("0");
    if status.is_success() && code == "0" {
        return Ok(body);
    }
    Err(build_error(status, &body, code))
}

fn build_error(status: StatusCode, body: &Value, code: &str) -> ExchangeError {
    let msg = body.get("msg").and_then(Value::as_str).unwrap_or("unknown OKX error").to_string();

    match code {
        "50113" | "50114" | "50111" => ExchangeError::AuthenticationError(msg),
        "51001" => ExchangeError::BadSymbol(msg),
        "51004" | "51008" => ExchangeError::InvalidOrder(msg),
        "51006" | "51010" => ExchangeError::InsufficientFunds(msg),
        "51400" | "51401" => ExchangeError::OrderNotFound(msg),
        "50061" => ExchangeError::RateLimitExceeded(msg),
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
    fn nonzero_code_over_http_200_is_an_error() {
        let error = validate(StatusCode::OK, json!({"code": "51001", "msg": "Instrument ID does not exist"})).unwrap_err();
        assert!(matches!(error, ExchangeError::BadSymbol(_)));
    }

    #[test]
    fn zero_code_passes_through() {
        let body = json!({"code": "0", "msg": "", "data": []});
        assert_eq!(validate(StatusCode::OK, body.clone()).unwrap(), body);
    }
}
