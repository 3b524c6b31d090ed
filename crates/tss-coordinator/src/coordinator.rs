//! Validator-side coordination of keygen and signing requests

use crate::backend::{CallContext, SigningBackend};
use crate::{
    Error, KeyUid, Outcome, ParticipantId, PartyUid, PayloadHash, ProtocolViolation, PublicKey,
    Result, Signature, TransportError,
};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// A request kind the coordinator issues to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Keygen,
    Sign,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Operation::Keygen => "keygen",
            Operation::Sign => "sign",
        }
    }

    fn failure_context(self) -> &'static str {
        match self {
            Operation::Keygen => "failed generating key",
            Operation::Sign => "failed signing",
        }
    }
}

/// Issues keygen and sign requests on behalf of one validator
///
/// All state is fixed at construction, so a coordinator can be shared
/// (e.g. behind an `Arc`) and called concurrently. Access to the backend is
/// not serialized here.
pub struct SigningCoordinator<B> {
    participant: ParticipantId,
    timeout: Duration,
    backend: B,
}

impl<B: SigningBackend> SigningCoordinator<B> {
    /// Create a coordinator for `participant` with a per-call `timeout`
    pub fn new(participant: ParticipantId, timeout: Duration, backend: B) -> Result<Self> {
        if participant.is_empty() {
            return Err(Error::InvalidConfig("participant identity is empty".into()));
        }
        if timeout.is_zero() {
            return Err(Error::InvalidConfig("timeout must be non-zero".into()));
        }

        Ok(Self {
            participant,
            timeout,
            backend,
        })
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether `candidate` is this validator
    pub fn is_participant(&self, candidate: &ParticipantId) -> bool {
        self.participant == *candidate
    }

    /// Name under which this validator joins a session
    pub fn party_uid(&self) -> PartyUid {
        PartyUid::from(&self.participant)
    }

    /// Generate the key named `key_uid` and return its public key
    ///
    /// # Panics
    /// If the backend answers with an unrecognized response. Release builds
    /// abort on panic so the process ends; in builds that unwind, a caller
    /// running this inside `tokio::spawn` receives the panic as a
    /// `JoinError` and must not resume signing after it.
    #[instrument(skip(self), fields(party = %self.participant))]
    pub async fn generate_key(&self, key_uid: &KeyUid) -> Result<PublicKey> {
        let ctx = CallContext::with_timeout(self.timeout);
        let party_uid = self.party_uid();

        let outcome = self
            .bounded(
                Operation::Keygen,
                &ctx,
                self.backend.keygen(&ctx, key_uid, &party_uid),
            )
            .await?;

        let public_key = interpret(Operation::Keygen, outcome)?;
        info!(public_key = hex::encode(public_key.as_bytes()), "Key generated");
        Ok(public_key)
    }

    /// Sign `payload_hash` with the key named `key_uid`
    ///
    /// # Panics
    /// If the backend answers with an unrecognized response. Release builds
    /// abort on panic so the process ends; in builds that unwind, a caller
    /// running this inside `tokio::spawn` receives the panic as a
    /// `JoinError` and must not resume signing after it.
    #[instrument(skip(self, payload_hash, public_key), fields(party = %self.participant))]
    pub async fn sign(
        &self,
        key_uid: &KeyUid,
        payload_hash: &PayloadHash,
        public_key: &PublicKey,
    ) -> Result<Signature> {
        let ctx = CallContext::with_timeout(self.timeout);
        let party_uid = self.party_uid();

        let outcome = self
            .bounded(
                Operation::Sign,
                &ctx,
                self.backend
                    .sign(&ctx, key_uid, payload_hash, &party_uid, public_key),
            )
            .await?;

        let signature = interpret(Operation::Sign, outcome)?;
        info!(
            payload_hash = hex::encode(payload_hash.as_bytes()),
            "Payload signed"
        );
        Ok(signature)
    }

    /// Await `call` until the context's deadline
    ///
    /// The pending backend future is dropped on every exit, which abandons
    /// the request from our side.
    async fn bounded<T, F>(
        &self,
        operation: Operation,
        ctx: &CallContext,
        call: F,
    ) -> Result<Outcome<T>>
    where
        F: Future<Output = std::result::Result<Outcome<T>, TransportError>>,
    {
        debug!(operation = operation.name(), timeout = ?ctx.timeout(), "Awaiting backend");

        let source = match tokio::time::timeout_at(ctx.deadline(), call).await {
            Ok(Ok(outcome)) => return Ok(outcome),
            Ok(Err(source)) => source,
            Err(_) => ctx.deadline_exceeded(),
        };

        Err(Error::Transport {
            context: operation.failure_context(),
            source,
        })
    }
}

/// Map a backend outcome onto the caller's result
fn interpret<T>(operation: Operation, outcome: Outcome<T>) -> Result<T> {
    match outcome {
        Outcome::Success(value) => Ok(value),
        Outcome::RecoverableError(message) => Err(Error::Backend {
            context: operation.failure_context(),
            message,
        }),
        Outcome::Unrecognized(shape) => ProtocolViolation::new(operation.name(), shape).fatal(),
    }
}
