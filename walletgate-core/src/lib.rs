//! Challenge-response wallet authentication core for walletgate

pub mod auth;
pub mod error;
pub mod types;

pub use error::*;
pub use types::*;

/// Result type alias for walletgate operations
pub type Result<T> = std::result::Result<T, GateError>;
