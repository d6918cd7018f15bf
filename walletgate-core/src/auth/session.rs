//! Session token issuance
//!
//! Tokens are opaque bearer credentials minted only after a successful
//! verification. Issuance is a capability so the opaque random token can
//! be replaced by a signed credential behind the same interface.

use crate::auth::timing::constant_time_str_compare;
use crate::types::WalletAddress;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use std::fmt;

/// Bytes of CSPRNG entropy per token: 256 bits once hex-encoded.
const TOKEN_LEN: usize = 32;

/// Opaque bearer token representing a completed authentication.
#[derive(Clone, Serialize)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap an existing token string (e.g. one presented by a client).
    pub fn from_string(token: String) -> Self {
        SessionToken(token)
    }

    /// Get the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are credentials; comparisons must not leak prefix length.
impl PartialEq for SessionToken {
    fn eq(&self, other: &Self) -> bool {
        constant_time_str_compare(&self.0, &other.0)
    }
}

impl Eq for SessionToken {}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&"[redacted]").finish()
    }
}

/// Mints bearer tokens for verified addresses.
pub trait TokenIssuer: Send + Sync {
    fn mint(&self, address: &WalletAddress) -> SessionToken;
}

/// Production issuer: 32 random bytes from the OS CSPRNG, hex-encoded.
///
/// Unique with overwhelming probability across the process lifetime. No
/// server-side record of issued tokens is kept; downstream authorization
/// is the surrounding system's concern.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokenIssuer;

impl TokenIssuer for RandomTokenIssuer {
    fn mint(&self, _address: &WalletAddress) -> SessionToken {
        let mut bytes = [0u8; TOKEN_LEN];
        OsRng.fill_bytes(&mut bytes);
        SessionToken(hex::encode(bytes))
    }
}

mod hex {
    use std::fmt::Write;

    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().fold(String::new(), |mut output, b| {
            let _ = write!(output, "{:02x}", b);
            output
        })
    }
}
