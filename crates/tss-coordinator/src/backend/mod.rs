//! Signing backend capability

use crate::{KeyUid, Outcome, PartyUid, PayloadHash, PublicKey, Signature, TransportError};
use std::time::Duration;
use tokio::time::Instant;

pub use ::async_trait::async_trait;

/// Deadline used when `now + timeout` is not representable (about 30 years)
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Deadline-bound context handed to every backend call
///
/// Implementations bound their own I/O by [`CallContext::remaining`]. When
/// the deadline passes before the backend answers the call must fail with
/// [`TransportError::DeadlineExceeded`] rather than produce an [`Outcome`].
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    deadline: Instant,
    timeout: Duration,
}

impl CallContext {
    /// Context expiring `timeout` from now
    ///
    /// Timeouts too large to add to the current instant saturate to a
    /// deadline decades away.
    pub fn with_timeout(timeout: Duration) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);
        Self { deadline, timeout }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// The budget this context was created with
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Time left before the deadline, zero once it has passed
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }

    pub fn deadline_exceeded(&self) -> TransportError {
        TransportError::DeadlineExceeded(self.timeout)
    }
}

/// Client of the external MPC signing process
#[async_trait]
pub trait SigningBackend: Send + Sync {
    /// Request generation of the key named `key_uid`
    async fn keygen(
        &self,
        ctx: &CallContext,
        key_uid: &KeyUid,
        party_uid: &PartyUid,
    ) -> Result<Outcome<PublicKey>, TransportError>;

    /// Request a signature over `payload_hash` with the key named `key_uid`
    async fn sign(
        &self,
        ctx: &CallContext,
        key_uid: &KeyUid,
        payload_hash: &PayloadHash,
        party_uid: &PartyUid,
        public_key: &PublicKey,
    ) -> Result<Outcome<Signature>, TransportError>;
}

/// Scripted in-memory backend for testing
pub mod memory;

pub use memory::{MemoryBackend, Reply};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_context_remaining_saturates() {
        let ctx = CallContext::with_timeout(Duration::from_secs(5));
        assert_eq!(ctx.remaining(), Duration::from_secs(5));
        assert!(!ctx.is_expired());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(ctx.remaining(), Duration::ZERO);
        assert!(ctx.is_expired());
        assert_eq!(
            ctx.deadline_exceeded(),
            TransportError::DeadlineExceeded(Duration::from_secs(5))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_timeout_saturates() {
        let ctx = CallContext::with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ctx.timeout(), Duration::from_secs(u64::MAX));
        assert_eq!(ctx.remaining(), FAR_FUTURE);
        assert!(!ctx.is_expired());
    }
}
