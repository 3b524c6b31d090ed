//! Core types for the signing protocol

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a payload hash in bytes
pub const PAYLOAD_HASH_LEN: usize = 32;

/// The validator's own identity in the signing protocol
///
/// Opaque address bytes. The string form is lowercase hex and is what the
/// backend sees as the party UID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(#[serde(with = "hex::serde")] Vec<u8>);

impl ParticipantId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse from a hex string, with or without `0x`
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim_start_matches("0x");
        let bytes = hex::decode(s)
            .map_err(|e| Error::InvalidInput(format!("participant {s:?}: {e}")))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// Logical name of a key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyUid(String);

impl KeyUid {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for KeyUid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for KeyUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of this validator within a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartyUid(String);

impl PartyUid {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&ParticipantId> for PartyUid {
    fn from(participant: &ParticipantId) -> Self {
        Self(participant.to_string())
    }
}

impl fmt::Display for PartyUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public key produced by key generation, in the backend's encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "hex::serde")] Vec<u8>);

impl PublicKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Signature produced by a signing session, in the backend's encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "hex::serde")] Vec<u8>);

impl Signature {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Digest of the message to sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadHash(#[serde(with = "hex::serde")] [u8; PAYLOAD_HASH_LEN]);

impl PayloadHash {
    pub fn new(bytes: [u8; PAYLOAD_HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse from a hex string, with or without `0x`
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim_start_matches("0x");
        let bytes =
            hex::decode(s).map_err(|e| Error::InvalidInput(format!("payload hash: {e}")))?;
        Self::try_from(bytes.as_slice())
    }

    pub fn as_bytes(&self) -> &[u8; PAYLOAD_HASH_LEN] {
        &self.0
    }
}

impl TryFrom<&[u8]> for PayloadHash {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let array: [u8; PAYLOAD_HASH_LEN] = bytes.try_into().map_err(|_| {
            Error::InvalidInput(format!(
                "payload hash must be {PAYLOAD_HASH_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }
}

/// Discriminated result of a backend request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The request succeeded
    Success(T),
    /// The backend refused or failed the request
    RecoverableError(String),
    /// The response matched no known shape; carries what was seen
    Unrecognized(String),
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::RecoverableError(message) => Outcome::RecoverableError(message),
            Outcome::Unrecognized(shape) => Outcome::Unrecognized(shape),
        }
    }
}
