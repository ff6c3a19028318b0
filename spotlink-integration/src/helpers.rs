//! Small, pure utilities used throughout the signing, parsing and transport layers: numeric
//! coercion that never silently defaults to zero, query serialisation, ISO-8601/epoch-ms
//! conversion, shallow JSON merging for config defaults, and a cooperative sleep.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::time::Duration;

/// Parse a JSON value that may be a string, number, or absent into `Option<f64>`.
///
/// Per the unified data model (spec §3/§9): a value a venue does not supply, or that parses to
/// NaN, is `None` — never coerced to `0.0`.
pub fn parse_optional_f64(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.is_empty() => s.parse::<f64>().ok(),
        _ => None,
    }?;
    if parsed.is_nan() { None } else { Some(parsed) }
}

/// As [`parse_optional_f64`], but fails loudly when the field is mandatory for the caller.
pub fn parse_required_f64(value: Option<&Value>, field: &str) -> Result<f64, String> {
    parse_optional_f64(value).ok_or_else(|| format!("missing or non-numeric field `{field}`"))
}

/// Render milliseconds-since-epoch as an ISO-8601 UTC string with millisecond precision.
pub fn iso8601_ms(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap())
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 UTC string back into milliseconds-since-epoch, exact to the millisecond.
pub fn iso8601_to_ms(datetime: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(datetime)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current wall-clock time in microseconds since the Unix epoch (Bitfinex nonce granularity).
pub fn now_us() -> i64 {
    Utc::now().timestamp_micros()
}

/// Serialise a flat string/string map into a `key=value&key=value` query string, sorted
/// lexicographically by key — the shape Binance, Bybit, LBank and Bitforex all sign over.
pub fn sorted_query_string(params: &[(String, String)]) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    sorted
        .into_iter()
        .map(|(k, v)| format!("{}={}", urlencode(&k), urlencode(&v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Serialise a flat string/string map into a query string preserving insertion order — used
/// where a venue's signature is order-sensitive rather than sort-sensitive.
pub fn ordered_query_string(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencode(k), urlencode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Shallow merge of `overrides` on top of `base`: for object values, keys present in `overrides`
/// replace the corresponding key in `base`; other JSON value kinds in `overrides` replace `base`
/// wholesale. Used to apply an adapter's `options.*` extension map on top of venue defaults.
pub fn deep_merge(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            for (key, value) in override_map {
                deep_merge(base_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (base_slot, overrides) => {
            *base_slot = overrides.clone();
        }
    }
}

/// Cooperative sleep suspension point, used by the throttler and WebSocket reconnect backoff.
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_field_is_none_not_zero() {
        assert_eq!(parse_optional_f64(None), None);
    }

    #[test]
    fn nan_string_is_none() {
        assert_eq!(parse_optional_f64(Some(&json!("NaN"))), None);
    }

    #[test]
    fn numeric_string_parses() {
        assert_eq!(parse_optional_f64(Some(&json!("12.5"))), Some(12.5));
    }

    #[test]
    fn iso_roundtrip_is_exact_to_millisecond() {
        let ts = 1_700_000_123_456_i64;
        let rendered = iso8601_ms(ts);
        assert_eq!(iso8601_to_ms(&rendered), Some(ts));
    }

    #[test]
    fn sorted_query_string_orders_by_key() {
        let params = vec![
            ("timestamp".to_string(), "1".to_string()),
            ("symbol".to_string(), "BTCUSDT".to_string()),
        ];
        assert_eq!(sorted_query_string(&params), "symbol=BTCUSDT&timestamp=1");
    }

    #[test]
    fn deep_merge_overlays_nested_keys() {
        let mut base = json!({"sandbox": false, "category": "spot"});
        let overrides = json!({"category": "linear"});
        deep_merge(&mut base, &overrides);
        assert_eq!(base, json!({"sandbox": false, "category": "linear"}));
    }
}
