//! In-memory backend implementation for testing

use super::{async_trait, CallContext, SigningBackend};
use crate::{KeyUid, Outcome, PartyUid, PayloadHash, PublicKey, Signature, TransportError};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How the backend answers a request for one key
#[derive(Debug, Clone)]
pub enum Reply<T> {
    /// Answer with `outcome` after the delay
    After(Duration, Outcome<T>),
    /// Fail at the transport level
    Fail(TransportError),
    /// Never answer
    Never,
}

impl<T> Reply<T> {
    /// Answer immediately
    pub fn now(outcome: Outcome<T>) -> Self {
        Reply::After(Duration::ZERO, outcome)
    }
}

/// Backend whose answers are scripted per key UID
#[derive(Clone, Default)]
pub struct MemoryBackend {
    keygen: Arc<DashMap<KeyUid, Reply<PublicKey>>>,
    sign: Arc<DashMap<KeyUid, Reply<Signature>>>,
    /// Party UID of the last request per key
    parties: Arc<DashMap<KeyUid, PartyUid>>,
    calls: Arc<AtomicUsize>,
}

impl MemoryBackend {
    /// Create a backend with nothing scripted
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the keygen answer for `key_uid`
    pub fn on_keygen(&self, key_uid: impl Into<KeyUid>, reply: Reply<PublicKey>) -> &Self {
        self.keygen.insert(key_uid.into(), reply);
        self
    }

    /// Script the sign answer for `key_uid`
    pub fn on_sign(&self, key_uid: impl Into<KeyUid>, reply: Reply<Signature>) -> &Self {
        self.sign.insert(key_uid.into(), reply);
        self
    }

    /// Party UID sent with the most recent request for `key_uid`
    pub fn party_seen(&self, key_uid: &KeyUid) -> Option<PartyUid> {
        self.parties.get(key_uid).map(|entry| entry.value().clone())
    }

    /// Number of requests received so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self, key_uid: &KeyUid, party_uid: &PartyUid) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.parties.insert(key_uid.clone(), party_uid.clone());
    }
}

async fn answer<T>(
    ctx: &CallContext,
    key_uid: &KeyUid,
    reply: Option<Reply<T>>,
) -> Result<Outcome<T>, TransportError> {
    let reply = match reply {
        Some(reply) => reply,
        None => {
            return Ok(Outcome::RecoverableError(format!(
                "no response scripted for key uid {key_uid}"
            )))
        }
    };

    match reply {
        Reply::After(delay, outcome) => {
            tokio::time::timeout_at(ctx.deadline(), tokio::time::sleep(delay))
                .await
                .map_err(|_| ctx.deadline_exceeded())?;
            Ok(outcome)
        }
        Reply::Fail(err) => Err(err),
        Reply::Never => {
            let _ = tokio::time::timeout_at(ctx.deadline(), std::future::pending::<()>()).await;
            Err(ctx.deadline_exceeded())
        }
    }
}

#[async_trait]
impl SigningBackend for MemoryBackend {
    async fn keygen(
        &self,
        ctx: &CallContext,
        key_uid: &KeyUid,
        party_uid: &PartyUid,
    ) -> Result<Outcome<PublicKey>, TransportError> {
        self.record(key_uid, party_uid);
        // Clone out so no map guard is held across the await
        let reply = self.keygen.get(key_uid).map(|entry| entry.value().clone());
        answer(ctx, key_uid, reply).await
    }

    async fn sign(
        &self,
        ctx: &CallContext,
        key_uid: &KeyUid,
        _payload_hash: &PayloadHash,
        party_uid: &PartyUid,
        _public_key: &PublicKey,
    ) -> Result<Outcome<Signature>, TransportError> {
        self.record(key_uid, party_uid);
        let reply = self.sign.get(key_uid).map(|entry| entry.value().clone());
        answer(ctx, key_uid, reply).await
    }
}
