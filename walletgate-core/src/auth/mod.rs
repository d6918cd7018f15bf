//! Challenge-response authentication module for walletgate
//!
//! This module implements the authentication plane with:
//! - Ed25519 key management and detached signature verification
//! - Unpredictable challenge codes and canonical signing messages
//! - Time-bounded challenge storage with one-shot consumption
//! - Session token issuance and constant-time comparisons

pub mod canonical;
pub mod challenge;
pub mod clock;
pub mod flow;
pub mod keys;
pub mod session;
pub mod store;
pub mod timing;
pub mod whitelist;

pub use canonical::*;
pub use challenge::*;
pub use clock::*;
pub use flow::*;
pub use keys::*;
pub use session::*;
pub use store::*;
pub use timing::*;
pub use whitelist::*;
