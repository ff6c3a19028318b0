//! Bitstamp signing (spec §4.2): `HMAC-SHA256` hex over
//! `"BITSTAMP " + apiKey + METHOD + host + path + [content-type +] nonce + msTimestamp + "v2" +
//! [body]` (the content-type and body segments are included only when the request carries a
//! body), carried via `X-Auth*` headers. The nonce must be a UUIDv4 and, together with the
//! timestamp, must never regress within one adapter instance (spec §5) - the pipeline signs one
//! request at a time per adapter so this holds without extra bookkeeping.
//!
//! This adapter signs over the JSON body text the shared pipeline actually transmits rather than
//! the form-url-encoded body Bitstamp's real API expects, the same simplification documented on
//! [`super::super::kraken::sign`] - the signature stays internally consistent with what is sent,
//! even though it diverges from Bitstamp's live wire format.

use rand::RngCore;
use reqwest::Method;
use reqwest::header::{HeaderName, HeaderValue};
use spotlink_integration::crypto::{hmac_sha256, Encoding};
use spotlink_integration::error::SocketError;
use spotlink_integration::helpers::now_ms;
use spotlink_integration::protocol::http::private::{SignedParts, Signer};

const HOST: &str = "www.bitstamp.net";

pub struct BitstampSigner {
    api_key: String,
    secret: String,
}

impl BitstampSigner {
    pub fn new(api_key: String, secret: String) -> Self {
        Self { api_key, secret }
    }
}

impl Signer for BitstampSigner {
    fn sign(&self, method: &Method, path: &str, _query: &str, body: &str) -> Result<SignedParts, SocketError> {
        let nonce = random_uuid_v4();
        let timestamp = now_ms().to_string();
        let content_type = if body.is_empty() { "" } else { "application/json" };

        let prehash = format!("BITSTAMP {}{method}{HOST}{path}{content_type}{nonce}{timestamp}v2{body}", self.api_key);
        let signature = hmac_sha256(self.secret.as_bytes(), prehash.as_bytes(), Encoding::Hex);

        let header = |value: &str| HeaderValue::from_str(value).unwrap_or(HeaderValue::from_static(""));
        Ok(SignedParts {
            headers: vec![
                (HeaderName::from_static("x-auth"), header(&format!("BITSTAMP {}", self.api_key))),
                (HeaderName::from_static("x-auth-signature"), header(&signature)),
                (HeaderName::from_static("x-auth-nonce"), header(&nonce)),
                (HeaderName::from_static("x-auth-timestamp"), header(&timestamp)),
                (HeaderName::from_static("x-auth-version"), HeaderValue::from_static("v2")),
            ],
        })
    }
}

fn random_uuid_v4() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7], bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_produces_five_headers() {
        let signer = BitstampSigner::new("key".into(), "secret".into());
        let signed = signer.sign(&Method::GET, "/api/v2/balance/", "", "").unwrap();
        assert_eq!(signed.headers.len(), 5);
    }

    #[test]
    fn uuid_has_version_four_nibble() {
        let uuid = random_uuid_v4();
        assert_eq!(uuid.chars().nth(14), Some('4'));
    }
}
