//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding a client message.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed command: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("non-finite steering angle")]
    NonFiniteAngle,
}
