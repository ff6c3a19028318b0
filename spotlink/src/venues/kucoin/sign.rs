//! KuCoin signing (spec §4.2): `HMAC-SHA256` base64 over `msTimestamp + METHOD + path + body`,
//! carried via `KC-API-*` headers. The passphrase itself is also HMAC-SHA256-base64'd with the
//! secret before being sent - KuCoin never receives the raw passphrase once API key version 2 is
//! in use.

use reqwest::Method;
use reqwest::header::{HeaderName, HeaderValue};
use spotlink_integration::crypto::{hmac_sha256, Encoding};
use spotlink_integration::error::SocketError;
use spotlink_integration::helpers::now_ms;
use spotlink_integration::protocol::http::private::{SignedParts, Signer};

pub struct KucoinSigner {
    api_key: String,
    secret: String,
    passphrase: String,
}

impl KucoinSigner {
    pub fn new(api_key: String, secret: String, passphrase: String) -> Self {
        Self { api_key, secret, passphrase }
    }
}

impl Signer for KucoinSigner {
    fn sign(&self, method: &Method, path: &str, query: &str, body: &str) -> Result<SignedParts, SocketError> {
        let timestamp = now_ms().to_string();
        let request_path = if query.is_empty() { path.to_string() } else { format!("{path}?{query}") };
        let prehash = format!("{timestamp}{method}{request_path}{body}");
        let signature = hmac_sha256(self.secret.as_bytes(), prehash.as_bytes(), Encoding::Base64);
        let signed_passphrase = hmac_sha256(self.secret.as_bytes(), self.passphrase.as_bytes(), Encoding::Base64);

        let header = |value: &str| HeaderValue::from_str(value).unwrap_or(HeaderValue::from_static(""));
        Ok(SignedParts {
            headers: vec![
                (HeaderName::from_static("kc-api-key"), header(&self.api_key)),
                (HeaderName::from_static("kc-api-sign"), header(&signature)),
                (HeaderName::from_static("kc-api-timestamp"), header(&timestamp)),
                (HeaderName::from_static("kc-api-passphrase"), header(&signed_passphrase)),
                (HeaderName::from_static("kc-api-key-version"), HeaderValue::from_static("2")),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_produces_five_headers() {
        let signer = KucoinSigner::new("key".into(), "secret".into(), "phrase".into());
        let signed = signer.sign(&Method::GET, "/api/v1/accounts", "", "").unwrap();
        assert_eq!(signed.headers.len(), 5);
    }
}
