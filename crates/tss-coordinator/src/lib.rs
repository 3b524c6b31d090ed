//! # TSS Coordinator
//!
//! Validator-side client logic for an external multi-party signing backend.
//!
//! The coordinator:
//! - issues key generation and signing requests on behalf of one validator
//! - bounds every request by a fixed per-call timeout
//! - maps the backend's three-way answer onto a typed result
//!
//! ## Outcomes
//!
//! Every backend answer is exactly one of success, a recoverable error
//! carrying the backend's message, or an unrecognized shape. The first two
//! come back to the caller; the last means the backend speaks a protocol we
//! do not, and the coordinator terminates rather than guess.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tss_coordinator::{KeyUid, ParticipantId, SigningCoordinator};
//!
//! let coordinator = SigningCoordinator::new(participant, timeout, backend)?;
//! let public_key = coordinator.generate_key(&KeyUid::from("key1")).await?;
//! let signature = coordinator.sign(&key_uid, &payload_hash, &public_key).await?;
//! ```

pub mod backend;
pub mod broadcast;
pub mod coordinator;
pub mod error;
pub mod types;

pub use backend::{CallContext, SigningBackend};
pub use broadcast::{Broadcaster, Submission};
pub use coordinator::SigningCoordinator;
pub use error::{Error, ProtocolViolation, Result, TransportError};
pub use types::{
    KeyUid, Outcome, ParticipantId, PartyUid, PayloadHash, PublicKey, Signature,
    PAYLOAD_HASH_LEN,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default per-call timeout for backend requests, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
