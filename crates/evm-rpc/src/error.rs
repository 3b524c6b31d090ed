//! Error types for chain client operations

use thiserror::Error;

/// Result type alias for chain client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to an EVM node
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// The request did not reach the node or its answer was lost
    #[error("Transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The requested object does not exist (yet)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The node's answer had an unexpected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e.to_string())
    }
}
