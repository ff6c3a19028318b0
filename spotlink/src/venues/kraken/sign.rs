//! Kraken signing (spec §4.2): `HMAC-SHA512(secret, path + SHA256(nonce + postdata))`, base64
//! encoded, carried via `API-Key`/`API-Sign` headers. `secret` ships base64 encoded and is
//! decoded once at construction.
//!
//! The base pipeline always serialises a `RestRequest::Body` as JSON rather than Kraken's native
//! form-urlencoded POST body (a simplification applied uniformly across every venue adapter, not
//! just this one); `nonce` is injected into that JSON body by [`KrakenSigner::apply`] before the
//! request is built, and `sign` reads it back out of the same serialised string it signs over so
//! the two always agree.

use reqwest::Method;
use reqwest::header::{HeaderName, HeaderValue};
use serde_json::Value;
use spotlink_integration::crypto::{base64_decode, hmac_sha512, sha256_bytes, Encoding};
use spotlink_integration::error::SocketError;
use spotlink_integration::helpers::now_us;
use spotlink_integration::protocol::http::private::{SignedParts, Signer};

#[derive(Clone)]
pub struct KrakenSigner {
    api_key: String,
    secret: Vec<u8>,
}

impl KrakenSigner {
    pub fn new(api_key: String, secret: &str) -> Self {
        let secret = base64_decode(secret).unwrap_or_default();
        Self { api_key, secret }
    }

    pub fn apply(&self, body: &mut Value) {
        body["nonce"] = Value::String(now_us().to_string());
    }
}

impl Signer for KrakenSigner {
    fn sign(&self, _method: &Method, path: &str, _query: &str, body: &str) -> Result<SignedParts, SocketError> {
        let nonce = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| value.get("nonce").and_then(Value::as_str).map(String::from))
            .unwrap_or_default();

        let digest = sha256_bytes(format!("{nonce}{body}").as_bytes());
        let mut message = path.as_bytes().to_vec();
        message.extend_from_slice(&digest);
        let signature = hmac_sha512(&self.secret, &message, Encoding::Base64);

        let header = |value: &str| HeaderValue::from_str(value).unwrap_or(HeaderValue::from_static(""));
        Ok(SignedParts {
            headers: vec![
                (HeaderName::from_static("api-key"), header(&self.api_key)),
                (HeaderName::from_static("api-sign"), header(&signature)),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_sets_a_nonce_field() {
        let mut body = serde_json::json!({});
        let signer = KrakenSigner::new("key".into(), "c2VjcmV0");
        signer.apply(&mut body);
        assert!(body.get("nonce").and_then(Value::as_str).is_some());
    }

    #[test]
    fn sign_is_deterministic_for_a_fixed_body() {
        let signer = KrakenSigner::new("key".into(), "c2VjcmV0");
        let body = r#"{"nonce":"123"}"#;
        let a = signer.sign(&Method::POST, "/0/private/Balance", "", body).unwrap();
        let b = signer.sign(&Method::POST, "/0/private/Balance", "", body).unwrap();
        assert_eq!(a.headers, b.headers);
    }
}
