//! Kraken envelope: `{"error": ["<Severity><Category>:<Message>"], "result": {...}}` over Http
//! 200; a non-empty `error` array is a failure regardless of status (spec §4.5).

use crate::error::ExchangeError;
use reqwest::StatusCode;
use serde_json::Value;

pub fn validate(status: StatusCode, body: Value) -> Result<Value, ExchangeError> {
    let errors = body.get("error").and_then(Value::as_array).cloned().unwrap_or_default();
    let messages: Vec<&str> = errors.iter().filter_map(Value::as_str).collect();
    if messages.is_empty() && status.is_success() {
        return Ok(body);
    }
    Err(build_error(status, &messages))
}

fn build_error(status: StatusCode, messages: &[&str]) -> ExchangeError {
    let joined = messages.join("; ");
    let first = messages.first().copied().unwrap_or("unknown Kraken error");

    if first.starts_with("EAPI:") || first.starts_with("EGeneral:Permission") {
        ExchangeError::AuthenticationError(joined)
    } else if first.starts_with("EOrder:Unknown order") {
        ExchangeError::OrderNotFound(joined)
    } else if first.starts_with("EOrder:Insufficient funds") {
        ExchangeError::InsufficientFunds(joined)
    } else if first.starts_with("EQuery:Unknown asset pair") {
        ExchangeError::BadSymbol(joined)
    } else if first.starts_with("EOrder:") {
        ExchangeError::InvalidOrder(joined)
    } else if first.starts_with("EGeneral:Invalid arguments") {
        ExchangeError::BadRequest(joined)
    } else if first.starts_with("EAPI:Rate limit") || status == StatusCode::TOO_MANY_REQUESTS {
        ExchangeError::RateLimitExceeded(joined)
    } else if first.starts_with("EService:") || status.is_server_error() {
        ExchangeError::ExchangeNotAvailable(joined)
    } else {
        ExchangeError::BadRequest(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nonempty_error_array_over_http_200_is_an_error() {
        let error = validate(StatusCode::OK, json!({"error": ["EOrder:Unknown order"], "result": {}})).unwrap_err();
        assert!(matches!(error, ExchangeError::OrderNotFound(_)));
    }

    #[test]
    fn empty_error_array_passes_through() {
        let body = json!({"error": [], "result": {"foo": "bar"}});
        assert_eq!(validate(StatusCode::OK, body.clone()).unwrap(), body);
    }
}
