//! Error types for walletgate

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("Address is not whitelisted")]
    NotWhitelisted,

    #[error("No active challenge for this address")]
    NoChallenge,

    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Signature verification failed")]
    VerificationFailed,

    #[error("Internal error: {0}")]
    Internal(String),
}
