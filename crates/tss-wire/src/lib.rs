//! Signing Backend Wire Format
//!
//! Request and response bodies exchanged with the signing backend over
//! HTTP. Bodies are JSON; byte fields are standard base64.
//!
//! Responses are one-of objects: exactly one of the known keys must be
//! present. Anything else is reported as [`Outcome::Unrecognized`] by the
//! `classify_*` functions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tss_coordinator::{Outcome, PublicKey, Signature};

/// Key generation endpoint
pub const KEYGEN_PATH: &str = "/v1/keygen";

/// Signing endpoint
pub const SIGN_PATH: &str = "/v1/sign";

/// Liveness endpoint
pub const HEALTH_PATH: &str = "/health";

/// Request to generate a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeygenRequest {
    pub key_uid: String,
    pub party_uid: String,
}

/// Answer to a [`KeygenRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeygenResponse {
    PubKey(#[serde(with = "b64")] Vec<u8>),
    Error(String),
}

/// Request to sign a payload hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequest {
    pub key_uid: String,
    #[serde(with = "b64")]
    pub msg_to_sign: Vec<u8>,
    pub party_uid: String,
    #[serde(with = "b64")]
    pub pub_key: Vec<u8>,
}

/// Answer to a [`SignRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignResponse {
    Signature(#[serde(with = "b64")] Vec<u8>),
    Error(String),
}

/// Interpret a keygen response body
pub fn classify_keygen(body: Value) -> Outcome<PublicKey> {
    let shape = describe(&body);
    match serde_json::from_value::<KeygenResponse>(body) {
        Ok(KeygenResponse::PubKey(bytes)) => Outcome::Success(PublicKey::new(bytes)),
        Ok(KeygenResponse::Error(message)) => Outcome::RecoverableError(message),
        Err(e) => Outcome::Unrecognized(format!("{shape} ({e})")),
    }
}

/// Interpret a sign response body
pub fn classify_sign(body: Value) -> Outcome<Signature> {
    let shape = describe(&body);
    match serde_json::from_value::<SignResponse>(body) {
        Ok(SignResponse::Signature(bytes)) => Outcome::Success(Signature::new(bytes)),
        Ok(SignResponse::Error(message)) => Outcome::RecoverableError(message),
        Err(e) => Outcome::Unrecognized(format!("{shape} ({e})")),
    }
}

/// Short description of a JSON value: the keys of an object, else its type
fn describe(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("{{{}}}", keys.join(", "))
        }
        Value::Null => "null".into(),
        Value::Bool(_) => "bool".into(),
        Value::Number(_) => "number".into(),
        Value::String(_) => "string".into(),
        Value::Array(_) => "array".into(),
    }
}

/// Base64 encoding for byte fields
mod b64 {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded)
            .map_err(|e| serde::de::Error::custom(format!("invalid base64: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keygen_success_and_error() {
        let body = serde_json::to_value(KeygenResponse::PubKey(vec![0xab, 0xcd])).unwrap();
        assert_eq!(body, json!({ "pub_key": "q80=" }));
        assert_eq!(
            classify_keygen(body),
            Outcome::Success(PublicKey::new(vec![0xab, 0xcd]))
        );

        assert_eq!(
            classify_keygen(json!({ "error": "invalid key" })),
            Outcome::RecoverableError("invalid key".into())
        );
    }

    #[test]
    fn test_sign_success_and_error() {
        assert_eq!(
            classify_sign(json!({ "signature": "MEQ=" })),
            Outcome::Success(Signature::new(vec![0x30, 0x44]))
        );
        assert_eq!(
            classify_sign(json!({ "error": "not enough parties" })),
            Outcome::RecoverableError("not enough parties".into())
        );
    }

    #[test]
    fn test_missing_variant_is_unrecognized() {
        match classify_keygen(json!({})) {
            Outcome::Unrecognized(shape) => assert!(shape.starts_with("{}")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(classify_sign(json!(null)), Outcome::Unrecognized(s) if s.starts_with("null")));
    }

    #[test]
    fn test_ambiguous_or_foreign_shapes_are_unrecognized() {
        let both = json!({ "pub_key": "q80=", "error": "boom" });
        assert!(matches!(classify_keygen(both), Outcome::Unrecognized(_)));

        match classify_sign(json!({ "status": "pending" })) {
            Outcome::Unrecognized(shape) => assert!(shape.starts_with("{status}")),
            other => panic!("unexpected {other:?}"),
        }

        // Known key, malformed payload
        assert!(matches!(
            classify_sign(json!({ "signature": "not base64!" })),
            Outcome::Unrecognized(_)
        ));
    }

    #[test]
    fn test_sign_request_encoding() {
        let req = SignRequest {
            key_uid: "key1".into(),
            msg_to_sign: vec![0xff; 2],
            party_uid: "0101".into(),
            pub_key: vec![0x02],
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["msg_to_sign"], "//8=");
        assert_eq!(value["pub_key"], "Ag==");
        assert_eq!(serde_json::from_value::<SignRequest>(value).unwrap(), req);
    }
}
