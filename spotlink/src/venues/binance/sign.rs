//! Binance signing dialect (spec §4.2): `HMAC-SHA256` hex over the exact query string sent,
//! carrying `timestamp`/`recvWindow`/`signature` as extra query params and the API key as a
//! header.

use reqwest::header::{HeaderName, HeaderValue};
use serde_json::{Map, Value};
use spotlink_integration::crypto::{hmac_sha256, Encoding};
use spotlink_integration::helpers::{now_ms, sorted_query_string};

pub struct BinanceSigner {
    api_key: String,
    secret: String,
}

impl BinanceSigner {
    pub fn new(api_key: String, secret: String) -> Self {
        Self { api_key, secret }
    }

    pub fn api_key_header(&self) -> Vec<(HeaderName, HeaderValue)> {
        vec![(
            HeaderName::from_static("x-mbx-apikey"),
            HeaderValue::from_str(&self.api_key).unwrap_or(HeaderValue::from_static("")),
        )]
    }

    /// Mutate `query` in place: add `timestamp`, `recvWindow`, then sign the resulting query
    /// string and append `signature`.
    pub fn apply(&self, query: &mut Value) {
        let object = query.as_object_mut().expect("query must be a JSON object");
        object.insert("timestamp".into(), Value::from(now_ms()));
        object
            .entry("recvWindow")
            .or_insert_with(|| Value::from(5000));

        let signature = self.sign_object(object);
        object.insert("signature".into(), Value::from(signature));
    }

    fn sign_object(&self, object: &Map<String, Value>) -> String {
        let pairs: Vec<(String, String)> = object
            .iter()
            .map(|(k, v)| (k.clone(), value_to_query_string(v)))
            .collect();
        let query_string = sorted_query_string(&pairs);
        hmac_sha256(self.secret.as_bytes(), query_string.as_bytes(), Encoding::Hex)
    }
}

fn value_to_query_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn signature_is_deterministic_for_fixed_timestamp() {
        let signer = BinanceSigner::new("key".into(), "secret".into());
        let mut object = Map::new();
        object.insert("symbol".into(), json!("BTCUSDT"));
        object.insert("timestamp".into(), json!(1_700_000_000_000_i64));
        let a = signer.sign_object(&object);
        let b = signer.sign_object(&object);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}
