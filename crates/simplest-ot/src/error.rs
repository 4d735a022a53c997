//! Error types for oblivious transfer operations

use thiserror::Error;

/// Result type alias for oblivious transfer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the protocol
#[derive(Debug, Error)]
pub enum Error {
    /// The secure random source failed to produce bytes
    #[error("Randomness unavailable: {0}")]
    RandomnessUnavailable(String),

    /// Supplied private key is not a scalar in [1, n-1]
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Peer public value is malformed, off-curve or the identity
    #[error("Invalid point: {0}")]
    InvalidPoint(String),

    /// AEAD tag did not verify
    #[error("Authentication failure")]
    AuthenticationFailure,

    /// The receiver has not recovered a message
    #[error("No message available")]
    NoMessageAvailable,

    /// Operation called in the wrong protocol phase
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Nonce does not match the cipher suite's length
    #[error("Invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength { expected: usize, actual: usize },

    /// Cryptographic operation failed
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Network/relay error
    #[error("Relay error: {0}")]
    Relay(String),

    /// Timeout waiting for message
    #[error("Timeout waiting for {0}")]
    Timeout(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
