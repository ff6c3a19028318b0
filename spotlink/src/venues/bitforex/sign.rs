//! Bitforex signing (spec §4.2): `HMAC-SHA256` hex over `path + "?" + sortedEncodedParams`,
//! where `params` includes `accessKey`, `nonce` and the endpoint's own fields. The signature
//! lands back inside the params as `signData` rather than a header, so - like Pionex - this
//! adapter signs by mutating the outgoing JSON object before the shared pipeline serializes it,
//! instead of implementing the header-carried `Signer` trait.

use serde_json::{Map, Value};
use spotlink_integration::crypto::{hmac_sha256, Encoding};
use spotlink_integration::helpers::{now_ms, sorted_query_string};

pub struct BitforexSigner {
    api_key: String,
    secret: String,
}

impl BitforexSigner {
    pub fn new(api_key: String, secret: String) -> Self {
        Self { api_key, secret }
    }

    /// Mutates `params` in place, adding `accessKey`, `nonce` and `signData`.
    pub fn apply(&self, path: &str, params: &mut Value) {
        let object = params.as_object_mut().expect("Bitforex params must be a JSON object");
        object.insert("accessKey".into(), Value::from(self.api_key.clone()));
        object.insert("nonce".into(), Value::from(now_ms().to_string()));

        let query = object_to_query(object);
        let prehash = format!("{path}?{query}");
        let signature = hmac_sha256(self.secret.as_bytes(), prehash.as_bytes(), Encoding::Hex);
        object.insert("signData".into(), Value::from(signature));
    }
}

fn object_to_query(object: &Map<String, Value>) -> String {
    let pairs: Vec<(String, String)> = object
        .iter()
        .map(|(k, v)| (k.clone(), match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
        .collect();
    sorted_query_string(&pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn apply_inserts_access_key_nonce_and_sign_data() {
        let signer = BitforexSigner::new("key".into(), "secret".into());
        let mut params = json!({ "symbol": "coin-usdt-btc" });
        signer.apply("/api/v1/trade/placeOrder", &mut params);
        let object = params.as_object().unwrap();
        assert!(object.contains_key("accessKey"));
        assert!(object.contains_key("nonce"));
        assert!(object.contains_key("signData"));
    }

    #[test]
    fn object_to_query_sorts_keys() {
        let object = json!({ "b": "2", "a": "1" });
        assert_eq!(object_to_query(object.as_object().unwrap()), "a=1&b=2");
    }
}
