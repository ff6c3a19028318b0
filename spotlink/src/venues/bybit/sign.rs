//! Bybit V5 signing dialect (spec §4.2): `HMAC-SHA256` hex over
//! `timestamp + api_key + recv_window + (query string | body)`, carried entirely in headers
//! rather than the query/body itself — unlike Binance, nothing needs to be mutated into the
//! request before it reaches the base pipeline.

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use spotlink_integration::crypto::{hmac_sha256, Encoding};
use spotlink_integration::error::SocketError;
use spotlink_integration::helpers::now_ms;
use spotlink_integration::protocol::http::private::{SignedParts, Signer};

pub struct BybitSigner {
    api_key: String,
    secret: String,
    recv_window: String,
}

impl BybitSigner {
    pub fn new(api_key: String, secret: String) -> Self {
        Self {
            api_key,
            secret,
            recv_window: "5000".to_string(),
        }
    }
}

impl Signer for BybitSigner {
    fn sign(&self, method: &Method, _path: &str, query: &str, body: &str) -> Result<SignedParts, SocketError> {
        let timestamp = now_ms().to_string();
        let payload = if *method == Method::GET { query } else { body };
        let sign_str = format!("{timestamp}{}{}{payload}", self.api_key, self.recv_window);
        let signature = hmac_sha256(self.secret.as_bytes(), sign_str.as_bytes(), Encoding::Hex);

        Ok(SignedParts {
            headers: vec![
                (HeaderName::from_static("x-bapi-api-key"), HeaderValue::from_str(&self.api_key).unwrap_or(HeaderValue::from_static(""))),
                (HeaderName::from_static("x-bapi-timestamp"), HeaderValue::from_str(&timestamp).unwrap_or(HeaderValue::from_static(""))),
                (HeaderName::from_static("x-bapi-recv-window"), HeaderValue::from_str(&self.recv_window).unwrap_or(HeaderValue::from_static(""))),
                (HeaderName::from_static("x-bapi-sign"), HeaderValue::from_str(&signature).unwrap_or(HeaderValue::from_static(""))),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_produces_four_headers() {
        let signer = BybitSigner::new("key".into(), "secret".into());
        let signed = signer.sign(&Method::GET, "/v5/order/create", "category=spot", "").unwrap();
        assert_eq!(signed.headers.len(), 4);
    }
}
