//! Hand-off of coordinator results to the chain

use crate::backend::async_trait;
use crate::{KeyUid, ParticipantId, PayloadHash, PublicKey, Result, Signature};
use serde::Serialize;

/// A coordinator result ready for submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Submission {
    PublicKey {
        key_uid: KeyUid,
        participant: ParticipantId,
        public_key: PublicKey,
    },
    Signature {
        key_uid: KeyUid,
        participant: ParticipantId,
        payload_hash: PayloadHash,
        signature: Signature,
    },
}

impl Submission {
    pub fn key_uid(&self) -> &KeyUid {
        match self {
            Submission::PublicKey { key_uid, .. } => key_uid,
            Submission::Signature { key_uid, .. } => key_uid,
        }
    }
}

/// Submits coordinator results to an external ledger
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(&self, submission: Submission) -> Result<()>;
}
