//! Cryptographic primitives shared by every venue's [`sign`](crate::protocol::http::private)
//! dialect: HMAC over SHA256/384/512, plain digests (SHA256/512, MD5), and the hex/base64
//! encodings venues disagree on for carrying the result.

use base64::Engine;
use hmac::{Hmac, Mac};
use md5::Md5;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Output encoding requested for a MAC or digest.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Encoding {
    Hex,
    Base64,
}

fn encode(bytes: &[u8], encoding: Encoding) -> String {
    match encoding {
        Encoding::Hex => hex::encode(bytes),
        Encoding::Base64 => base64::engine::general_purpose::STANDARD.encode(bytes),
    }
}

/// HMAC-SHA256 over `payload` keyed by `secret`, encoded per `encoding`.
///
/// Used by Binance (hex), Bybit (hex), OKX (base64), KuCoin (base64), LBank (hex), Bitforex
/// (hex), Pionex (hex).
pub fn hmac_sha256(secret: &[u8], payload: &[u8], encoding: Encoding) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(payload);
    encode(&mac.finalize().into_bytes(), encoding)
}

/// HMAC-SHA384 over `payload`, hex encoded. Used by Bitfinex.
pub fn hmac_sha384_hex(secret: &[u8], payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha384>::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// HMAC-SHA512 over `payload`, encoded per `encoding`. Used by Kraken (base64), Gate.io (hex),
/// Bittrex (hex).
pub fn hmac_sha512(secret: &[u8], payload: &[u8], encoding: Encoding) -> String {
    let mut mac = Hmac::<Sha512>::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(payload);
    encode(&mac.finalize().into_bytes(), encoding)
}

/// Plain SHA256 digest, hex encoded.
pub fn sha256_hex(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Plain SHA256 digest, raw bytes — Kraken's `SHA256(nonce + postData)` step feeds this
/// straight into an HMAC-SHA512 payload rather than being hex-encoded first.
pub fn sha256_bytes(payload: &[u8]) -> Vec<u8> {
    Sha256::digest(payload).to_vec()
}

/// Plain SHA512 digest, hex encoded — Bittrex signs over `SHA512(body)`.
pub fn sha512_hex(payload: &[u8]) -> String {
    hex::encode(Sha512::digest(payload))
}

/// Plain SHA512 digest, raw bytes — Gate.io's payload string embeds this directly.
pub fn sha512_bytes(payload: &[u8]) -> Vec<u8> {
    Sha512::digest(payload).to_vec()
}

/// Uppercase hex MD5 digest — LBank hashes its sorted parameter string with MD5 before the
/// outer HMAC-SHA256 pass.
pub fn md5_hex_upper(payload: &[u8]) -> String {
    hex::encode_upper(Md5::digest(payload))
}

/// Base64-decode a venue secret (Kraken ships its secret already base64 encoded).
pub fn base64_decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::engine::general_purpose::STANDARD.decode(input)
}

pub fn base64_encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Vector from RFC 4231 test case 2.
    #[test]
    fn hmac_sha256_rfc4231_vector() {
        let secret = b"Jefe";
        let payload = b"what do ya want for nothing?";
        let sig = hmac_sha256(secret, payload, Encoding::Hex);
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn hex_and_base64_agree_on_same_bytes() {
        let secret = b"mysecret";
        let payload = b"mypayload";
        let hex_sig = hmac_sha256(secret, payload, Encoding::Hex);
        let b64_sig = hmac_sha256(secret, payload, Encoding::Base64);
        let hex_bytes = hex::decode(hex_sig).unwrap();
        let b64_bytes = base64::engine::general_purpose::STANDARD
            .decode(b64_sig)
            .unwrap();
        assert_eq!(hex_bytes, b64_bytes);
    }

    #[test]
    fn md5_hex_upper_is_uppercase() {
        let digest = md5_hex_upper(b"api_key=1&secret_key=2");
        assert_eq!(digest, digest.to_uppercase());
    }

    #[test]
    fn deterministic_for_fixed_inputs() {
        let a = hmac_sha256(b"k", b"v", Encoding::Hex);
        let b = hmac_sha256(b"k", b"v", Encoding::Hex);
        assert_eq!(a, b);
    }
}
