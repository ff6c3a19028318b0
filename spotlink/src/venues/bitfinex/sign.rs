//! Bitfinex V2 signing (spec §4.2): `HMAC-SHA384` hex over `/api/<path><nonce><body>`, carried
//! via `bfx-apikey`/`bfx-signature`/`bfx-nonce` headers.

use reqwest::Method;
use reqwest::header::{HeaderName, HeaderValue};
use spotlink_integration::crypto::hmac_sha384_hex;
use spotlink_integration::error::SocketError;
use spotlink_integration::helpers::now_us;
use spotlink_integration::protocol::http::private::{SignedParts, Signer};

pub struct BitfinexSigner {
    api_key: String,
    secret: String,
}

impl BitfinexSigner {
    pub fn new(api_key: String, secret: String) -> Self {
        Self { api_key, secret }
    }
}

impl Signer for BitfinexSigner {
    fn sign(&self, _method: &Method, path: &str, _query: &str, body: &str) -> Result<SignedParts, SocketError> {
        let nonce = now_us().to_string();
        let prehash = format!("/api/{path}{nonce}{body}");
        let signature = hmac_sha384_hex(self.secret.as_bytes(), prehash.as_bytes());

        let header = |value: &str| HeaderValue::from_str(value).unwrap_or(HeaderValue::from_static(""));
        Ok(SignedParts {
            headers: vec![
                (HeaderName::from_static("bfx-apikey"), header(&self.api_key)),
                (HeaderName::from_static("bfx-nonce"), header(&nonce)),
                (HeaderName::from_static("bfx-signature"), header(&signature)),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_produces_three_headers() {
        let signer = BitfinexSigner::new("key".into(), "secret".into());
        let signed = signer.sign(&Method::POST, "v2/auth/r/wallets", "", "{}").unwrap();
        assert_eq!(signed.headers.len(), 3);
    }
}
