//! In-memory secp256k1 keystore

use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use k256::ecdsa::{signature::hazmat::PrehashSigner, SigningKey};
use rand::rngs::OsRng;
use std::sync::Arc;
use thiserror::Error;

/// Keystore error types
///
/// The display text is what the backend sends back as its error message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeystoreError {
    #[error("key uid {0} already exists")]
    AlreadyExists(String),
    #[error("unknown key uid {0}")]
    UnknownKey(String),
    #[error("public key mismatch for key uid {0}")]
    PublicKeyMismatch(String),
    #[error("message to sign must be 32 bytes, got {0}")]
    InvalidDigest(usize),
    #[error("signing failed: {0}")]
    Signing(String),
}

pub type Result<T> = std::result::Result<T, KeystoreError>;

/// A generated key
pub struct StoredKey {
    signing_key: SigningKey,
    /// Compressed SEC1 public key
    public_key: Vec<u8>,
    /// Party that requested the key
    pub party_uid: String,
    pub created_at: DateTime<Utc>,
}

/// Keys indexed by key UID
#[derive(Clone, Default)]
pub struct Keystore {
    keys: Arc<DashMap<String, StoredKey>>,
}

impl Keystore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh key under `key_uid` and return its public key
    pub fn generate(&self, key_uid: &str, party_uid: &str) -> Result<Vec<u8>> {
        match self.keys.entry(key_uid.to_string()) {
            Entry::Occupied(_) => Err(KeystoreError::AlreadyExists(key_uid.to_string())),
            Entry::Vacant(slot) => {
                let signing_key = SigningKey::random(&mut OsRng);
                let public_key = signing_key
                    .verifying_key()
                    .to_encoded_point(true)
                    .as_bytes()
                    .to_vec();

                slot.insert(StoredKey {
                    signing_key,
                    public_key: public_key.clone(),
                    party_uid: party_uid.to_string(),
                    created_at: Utc::now(),
                });
                Ok(public_key)
            }
        }
    }

    /// Sign a 32-byte digest with the key under `key_uid`
    ///
    /// The caller's `public_key` must match the stored one. The signature is
    /// DER-encoded with low S.
    pub fn sign(&self, key_uid: &str, digest: &[u8], public_key: &[u8]) -> Result<Vec<u8>> {
        let key = self
            .keys
            .get(key_uid)
            .ok_or_else(|| KeystoreError::UnknownKey(key_uid.to_string()))?;

        if key.public_key != public_key {
            return Err(KeystoreError::PublicKeyMismatch(key_uid.to_string()));
        }
        if digest.len() != 32 {
            return Err(KeystoreError::InvalidDigest(digest.len()));
        }

        let signature: k256::ecdsa::Signature = key
            .signing_key
            .sign_prehash(digest)
            .map_err(|e| KeystoreError::Signing(e.to_string()))?;
        let signature = signature.normalize_s().unwrap_or(signature);

        Ok(signature.to_der().as_bytes().to_vec())
    }

    /// Public key stored under `key_uid`
    pub fn public_key(&self, key_uid: &str) -> Option<Vec<u8>> {
        self.keys.get(key_uid).map(|key| key.public_key.clone())
    }

    /// Creation time of the key under `key_uid`
    pub fn created_at(&self, key_uid: &str) -> Option<DateTime<Utc>> {
        self.keys.get(key_uid).map(|key| key.created_at)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
