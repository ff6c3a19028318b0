//! OKX V5 signing: `HMAC-SHA256(timestamp + method + requestPath + body)`, base64 encoded,
//! carried via `OK-ACCESS-*` headers (spec §4.2). `requestPath` includes the query string.

use reqwest::Method;
use reqwest::header::{HeaderName, HeaderValue};
use spotlink_integration::crypto::{hmac_sha256, Encoding};
use spotlink_integration::error::SocketError;
use spotlink_integration::helpers::{iso8601_ms, now_ms};
use spotlink_integration::protocol::http::private::{SignedParts, Signer};

#[derive(Clone)]
pub struct OkxSigner {
    api_key: String,
    secret: String,
    passphrase: String,
}

impl OkxSigner {
    pub fn new(api_key: String, secret: String, passphrase: String) -> Self {
        Self { api_key, secret, passphrase }
    }
}

impl Signer for OkxSigner {
    fn sign(&self, method: &Method, path: &str, query: &str, body: &str) -> Result<SignedParts, SocketError> {
        let timestamp = iso8601_ms(now_ms());
        let request_path = if query.is_empty() { path.to_string() } else { format!("{path}?{query}") };
        let prehash = format!("{timestamp}{method}{request_path}{body}");
        let signature = hmac_sha256(self.secret.as_bytes(), prehash.as_bytes(), Encoding::Base64);

        let header = |value: &str| HeaderValue::from_str(value).unwrap_or(HeaderValue::from_static(""));
        Ok(SignedParts {
            headers: vec![
                (HeaderName::from_static("ok-access-key"), header(&self.api_key)),
                (HeaderName::from_static("ok-access-sign"), header(&signature)),
                (HeaderName::from_static("ok-access-timestamp"), header(&timestamp)),
                (HeaderName::from_static("ok-access-passphrase"), header(&self.passphrase)),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_base64_and_deterministic_for_a_fixed_prehash() {
        let a = hmac_sha256(b"secret", b"2020-01-01T00:00:00.000ZGET/api/v5/market/ticker", Encoding::Base64);
        let b = hmac_sha256(b"secret", b"2020-01-01T00:00:00.000ZGET/api/v5/market/ticker", Encoding::Base64);
        assert_eq!(a, b);
        assert!(base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &a).is_ok());
    }
}
