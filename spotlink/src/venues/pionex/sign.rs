//! Pionex signing (spec §4.2): `HMAC-SHA256` hex over
//! `METHOD + path + "?" + sortedRawQueryIncludingTimestamp + [jsonBody]`, carried via
//! `PIONEX-KEY`/`PIONEX-SIGNATURE` headers. The `timestamp` query field must reach the venue
//! as part of the request itself, not just the signature, so the adapter injects it into the
//! outgoing query before the shared pipeline serialises it; this signer then re-derives the
//! query string it needs to match, over exactly the bytes the pipeline transmits rather than
//! re-sorting independently - the same simplification documented on
//! [`super::super::kraken::sign`] for JSON-vs-form-urlencoded bodies.
//!
//! Pionex's DELETE-with-body endpoints leave the signing-input/Http-encoding ordering
//! under-specified; this is preserved as an open question rather than guessed at.

use reqwest::Method;
use reqwest::header::{HeaderName, HeaderValue};
use spotlink_integration::crypto::{hmac_sha256, Encoding};
use spotlink_integration::error::SocketError;
use spotlink_integration::protocol::http::private::{SignedParts, Signer};

pub struct PionexSigner {
    api_key: String,
    secret: String,
}

impl PionexSigner {
    pub fn new(api_key: String, secret: String) -> Self {
        Self { api_key, secret }
    }
}

impl Signer for PionexSigner {
    fn sign(&self, method: &Method, path: &str, query: &str, body: &str) -> Result<SignedParts, SocketError> {
        let prehash = if query.is_empty() { format!("{method}{path}?{body}") } else { format!("{method}{path}?{query}{body}") };
        let signature = hmac_sha256(self.secret.as_bytes(), prehash.as_bytes(), Encoding::Hex);

        let header = |value: &str| HeaderValue::from_str(value).unwrap_or(HeaderValue::from_static(""));
        Ok(SignedParts {
            headers: vec![
                (HeaderName::from_static("pionex-key"), header(&self.api_key)),
                (HeaderName::from_static("pionex-signature"), header(&signature)),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_produces_two_headers() {
        let signer = PionexSigner::new("key".into(), "secret".into());
        let signed = signer.sign(&Method::GET, "/api/v1/account/balances", "timestamp=1", "").unwrap();
        assert_eq!(signed.headers.len(), 2);
    }

    #[test]
    fn signature_is_deterministic_for_same_inputs() {
        let signer = PionexSigner::new("key".into(), "secret".into());
        let a = signer.sign(&Method::GET, "/p", "timestamp=1", "").unwrap();
        let b = signer.sign(&Method::GET, "/p", "timestamp=1", "").unwrap();
        assert_eq!(a.headers, b.headers);
    }
}
