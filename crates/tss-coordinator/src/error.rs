//! Error types for coordinator operations

use std::time::Duration;
use thiserror::Error;

/// Result type alias for coordinator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned to callers of the coordinator
///
/// Both variants are recoverable at a higher layer. A response the
/// coordinator does not understand is not represented here; see
/// [`ProtocolViolation`].
#[derive(Debug, Error)]
pub enum Error {
    /// The remote call itself failed
    #[error("{context}: {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: TransportError,
    },

    /// The backend reported an operational failure
    #[error("{context}: {message}")]
    Backend {
        context: &'static str,
        message: String,
    },

    /// Invalid coordinator configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed caller-supplied input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Whether the failure happened below the signing protocol
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }

    /// Whether the call was cut off by the coordinator's deadline
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Transport {
                source: TransportError::DeadlineExceeded(_),
                ..
            }
        )
    }

    /// The backend's own message, if the backend rejected the request
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Error::Backend { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Failures of the channel to the signing backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The deadline elapsed before the backend answered
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// Could not reach the backend
    #[error("connection failed: {0}")]
    Connection(String),

    /// The backend answered with a non-success status
    #[error("backend returned status {0}")]
    Status(u16),

    /// The response body could not be read
    #[error("undecodable response: {0}")]
    Decode(String),
}

/// The backend answered with a shape that is none of the known outcomes
///
/// This is never handed back as an error value. Continuing after it could
/// put an unvalidated key or signature on chain, so [`ProtocolViolation::fatal`]
/// ends the process (the release profile aborts on panic).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown multisig {operation} response {shape}")]
pub struct ProtocolViolation {
    /// Which request received the response
    pub operation: &'static str,
    /// Description of what the backend sent
    pub shape: String,
}

impl ProtocolViolation {
    pub fn new(operation: &'static str, shape: impl Into<String>) -> Self {
        Self {
            operation,
            shape: shape.into(),
        }
    }

    /// Log and terminate
    ///
    /// Panics; the release profile sets `panic = "abort"`, which turns this
    /// into process termination. Unwinding builds only stop the calling task.
    pub fn fatal(self) -> ! {
        tracing::error!(
            operation = self.operation,
            shape = %self.shape,
            "signing backend violated the response protocol"
        );
        panic!("{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_text_carries_context_and_cause() {
        let err = Error::Backend {
            context: "failed signing",
            message: "not enough parties".into(),
        };
        assert_eq!(err.to_string(), "failed signing: not enough parties");
        assert_eq!(err.backend_message(), Some("not enough parties"));
        assert!(!err.is_transport());

        let err = Error::Transport {
            context: "failed generating key",
            source: TransportError::DeadlineExceeded(Duration::from_secs(5)),
        };
        assert!(err.to_string().starts_with("failed generating key: deadline"));
        assert!(err.is_timeout());
    }

    #[test]
    #[should_panic(expected = "unknown multisig keygen response {}")]
    fn test_violation_is_fatal() {
        ProtocolViolation::new("keygen", "{}").fatal();
    }
}
